use clap::Subcommand;
use examroom_core::TimerMode;

use crate::common::{open_board, parse_id, print_outcome, CliResult, StdinConfirm};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the exam's timer
    Start {
        /// Exam ID
        id: String,
    },
    /// Pause the exam's timer
    Pause {
        /// Exam ID
        id: String,
    },
    /// Reset the timer in its current mode
    Reset {
        /// Exam ID
        id: String,
        /// Clear recorded study time even in Pomodoro mode
        #[arg(long)]
        study_time: bool,
    },
    /// End the current Pomodoro phase early
    Skip {
        /// Exam ID
        id: String,
    },
    /// Switch between stopwatch and Pomodoro
    Mode {
        /// Exam ID
        id: String,
        /// "stopwatch" or "pomodoro"
        mode: TimerMode,
    },
    /// Print the exam's timer state as JSON
    Status {
        /// Exam ID
        id: String,
    },
}

pub fn run(action: TimerAction, yes: bool) -> CliResult {
    let mut confirm = StdinConfirm::new(yes);
    let mut board = open_board(&mut confirm)?;

    match action {
        TimerAction::Start { id } => {
            let outcome = board.start(parse_id(&id)?)?;
            print_outcome(&outcome)?;
        }
        TimerAction::Pause { id } => {
            let outcome = board.pause(parse_id(&id)?)?;
            print_outcome(&outcome)?;
        }
        TimerAction::Reset { id, study_time } => {
            let id = parse_id(&id)?;
            let outcome = if study_time {
                board.reset_study_time(id, &mut confirm)?
            } else {
                board.reset(id, &mut confirm)?
            };
            print_outcome(&outcome)?;
        }
        TimerAction::Skip { id } => {
            let outcome = board.skip(parse_id(&id)?, &mut confirm)?;
            print_outcome(&outcome)?;
        }
        TimerAction::Mode { id, mode } => {
            let outcome = board.set_mode(parse_id(&id)?, mode)?;
            print_outcome(&outcome)?;
        }
        TimerAction::Status { id } => {
            // Advance any phase that expired while nothing was running.
            let report = board.tick()?;
            for event in &report.events {
                println!("{}", serde_json::to_string_pretty(event)?);
            }
            let status = board.status(parse_id(&id)?)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    board.shutdown();
    Ok(())
}

pub fn history(id: &str, yes: bool) -> CliResult {
    let mut confirm = StdinConfirm::new(yes);
    let board = open_board(&mut confirm)?;
    let id = parse_id(id)?;
    let exam = board.get(id).ok_or_else(|| format!("No exam with id {id}"))?;
    let json = serde_json::json!({
        "id": id,
        "totalStudySeconds": exam.ledger.total_secs(),
        "elapsedSeconds": board.elapsed(id)?,
        "sessions": board.session_history(id)?,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    board.shutdown();
    Ok(())
}
