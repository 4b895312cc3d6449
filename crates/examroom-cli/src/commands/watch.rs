//! Live view: one status line per exam on every tick.

use examroom_core::timer::format::format_clock;
use examroom_core::{Database, ExamBoard, ExamStatus, TickScheduler};
use tracing::debug;

use crate::common::{open_board, CliResult, StdinConfirm};

pub fn run(ticks: Option<u64>, yes: bool) -> CliResult {
    let mut confirm = StdinConfirm::new(yes);
    let board = open_board(&mut confirm)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()?;
    runtime.block_on(watch(board, ticks))
}

async fn watch(mut board: ExamBoard<Database>, limit: Option<u64>) -> CliResult {
    let mut scheduler = TickScheduler::new();
    let mut rx = scheduler.start(board.config().tick_interval());
    let mut seen = 0u64;

    loop {
        let tick = tokio::select! {
            tick = rx.recv() => tick,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                None
            }
        };
        let Some(tick) = tick else { break };

        let report = board.tick()?;
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
        println!("── tick {} ──", tick.seq);
        for status in &report.statuses {
            println!("{}", status_line(status));
        }

        seen += 1;
        if limit.is_some_and(|n| seen >= n) {
            break;
        }
    }

    scheduler.cancel();
    board.shutdown();
    Ok(())
}

fn status_line(s: &ExamStatus) -> String {
    let timer = match (&s.phase, s.running) {
        (Some(p), running) => format!(
            "{} {}{} (#{})",
            p.phase.label(),
            format_clock(p.remaining_secs),
            if running { "" } else { " paused" },
            p.focus_count
        ),
        (None, true) => "stopwatch running".to_string(),
        (None, false) => "stopped".to_string(),
    };
    format!(
        "{}  {:<20} {:>10}  studied {:<10} {}  {}%",
        s.id, s.subject, s.until_text, s.elapsed_text, timer, s.progress.percent
    )
}
