//! Helpers shared by the command handlers.

use std::io::{BufRead, Write};

use examroom_core::{
    CommandOutcome, Config, Confirm, Database, ExamBoard, ExamId, Feedback, Prompt,
};

use crate::bell;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Confirms on stdin with a `[y/N]` prompt, or always when `--yes` was given.
pub struct StdinConfirm {
    assume_yes: bool,
}

impl StdinConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: Prompt) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt.message());
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES")
    }
}

/// Open the on-disk board with the user's configuration.
pub fn open_board(confirm: &mut StdinConfirm) -> CliResult<ExamBoard<Database>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let feedback = Feedback::acquire(bell::open);
    let clock = examroom_core::SystemClock;
    let (board, report) = ExamBoard::open(db, clock, config, feedback, confirm)?;
    if report.corrupt && !report.discarded {
        eprintln!("warning: saved exam data is unreadable and was left untouched");
    }
    Ok(board)
}

pub fn parse_id(raw: &str) -> CliResult<ExamId> {
    raw.parse::<ExamId>()
        .map_err(|_| format!("invalid exam id: {raw}").into())
}

/// Print the events a command produced, or why it produced none.
pub fn print_outcome(outcome: &CommandOutcome) -> CliResult {
    match outcome {
        CommandOutcome::Applied(events) => {
            for event in events {
                println!("{}", serde_json::to_string_pretty(event)?);
            }
        }
        CommandOutcome::Unchanged => println!("nothing to do"),
        CommandOutcome::Declined => println!("cancelled"),
    }
    Ok(())
}
