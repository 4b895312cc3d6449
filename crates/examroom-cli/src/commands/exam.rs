//! Exam management commands for CLI.

use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use examroom_core::timer::format::format_time_12h;
use examroom_core::{ExamDraft, MaterialItem};

use crate::common::{open_board, parse_id, print_outcome, CliResult, StdinConfirm};

#[derive(Subcommand)]
pub enum ExamAction {
    /// Add an exam
    Add {
        /// Subject name
        #[arg(long)]
        subject: String,
        /// Exam date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Start time (HH:MM, 24-hour)
        #[arg(long)]
        time: String,
        /// Material to study (repeat for several items)
        #[arg(long = "material", required = true)]
        material: Vec<String>,
        /// Question types to expect
        #[arg(long)]
        questions: String,
    },
    /// Edit an exam; omitted fields keep their value
    Edit {
        /// Exam ID
        id: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        /// Replace the whole checklist (repeatable)
        #[arg(long = "material")]
        material: Vec<String>,
        #[arg(long)]
        questions: Option<String>,
    },
    /// List exams, soonest first
    List,
    /// Print one exam with its live status as JSON
    Show {
        /// Exam ID
        id: String,
    },
    /// Delete an exam
    Delete {
        /// Exam ID
        id: String,
    },
    /// Material checklist
    Material {
        #[command(subcommand)]
        action: MaterialAction,
    },
}

#[derive(Subcommand)]
pub enum MaterialAction {
    /// Append an item
    Add {
        /// Exam ID
        id: String,
        /// Item text
        text: String,
    },
    /// Tick or untick an item (1-based position)
    Toggle { id: String, position: usize },
    /// Remove an item (1-based position)
    Remove { id: String, position: usize },
}

fn parse_date(raw: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{raw}': {e}").into())
}

fn parse_time(raw: &str) -> CliResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{raw}': {e}").into())
}

/// Positions on the command line start at 1.
fn index(position: usize) -> CliResult<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| "positions start at 1".into())
}

pub fn run(action: ExamAction, yes: bool) -> CliResult {
    let mut confirm = StdinConfirm::new(yes);
    let mut board = open_board(&mut confirm)?;

    match action {
        ExamAction::Add {
            subject,
            date,
            time,
            material,
            questions,
        } => {
            let draft = ExamDraft {
                subject,
                date: parse_date(&date)?,
                time: parse_time(&time)?,
                material: material.into_iter().map(MaterialItem::new).collect(),
                question_types: questions,
            };
            let id = board.add_exam(draft)?;
            println!("Exam added: {id}");
        }
        ExamAction::Edit {
            id,
            subject,
            date,
            time,
            material,
            questions,
        } => {
            let id = parse_id(&id)?;
            let current = board
                .get(id)
                .ok_or_else(|| format!("no exam with id {id}"))?;
            let draft = ExamDraft {
                subject: subject.unwrap_or_else(|| current.subject.clone()),
                date: date.as_deref().map(parse_date).transpose()?.unwrap_or(current.date),
                time: time.as_deref().map(parse_time).transpose()?.unwrap_or(current.time),
                material: if material.is_empty() {
                    current.material.clone()
                } else {
                    material.into_iter().map(MaterialItem::new).collect()
                },
                question_types: questions.unwrap_or_else(|| current.question_types.clone()),
            };
            board.update_exam(id, draft)?;
            println!("Exam updated: {id}");
        }
        ExamAction::List => {
            let statuses = board.statuses();
            if statuses.is_empty() {
                println!("No exams yet.");
            }
            for s in statuses {
                println!(
                    "{}  {} {}  {}  [{}]  {}/{} done ({}%)  studied {}",
                    s.id,
                    s.starts_at.date(),
                    format_time_12h(s.starts_at.time()),
                    s.subject,
                    s.countdown_label,
                    s.progress.completed,
                    s.progress.total,
                    s.progress.percent,
                    s.elapsed_text,
                );
            }
        }
        ExamAction::Show { id } => {
            let id = parse_id(&id)?;
            let status = board.status(id)?;
            let exam = board.get(id).ok_or_else(|| format!("no exam with id {id}"))?;
            let json = serde_json::json!({ "exam": exam, "status": status });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        ExamAction::Delete { id } => {
            let id = parse_id(&id)?;
            let outcome = board.delete_exam(id, &mut confirm)?;
            print_outcome(&outcome)?;
        }
        ExamAction::Material { action } => match action {
            MaterialAction::Add { id, text } => {
                let id = parse_id(&id)?;
                board.add_material(id, &text)?;
                print_checklist(&board, id)?;
            }
            MaterialAction::Toggle { id, position } => {
                let id = parse_id(&id)?;
                board.toggle_material(id, index(position)?)?;
                print_checklist(&board, id)?;
            }
            MaterialAction::Remove { id, position } => {
                let id = parse_id(&id)?;
                let removed = board.remove_material(id, index(position)?)?;
                println!("Removed: {}", removed.text);
                print_checklist(&board, id)?;
            }
        },
    }

    board.shutdown();
    Ok(())
}

fn print_checklist<S: examroom_core::KvStore>(
    board: &examroom_core::ExamBoard<S>,
    id: examroom_core::ExamId,
) -> CliResult {
    let exam = board.get(id).ok_or_else(|| format!("no exam with id {id}"))?;
    for (i, item) in exam.material.iter().enumerate() {
        let mark = if item.done { "x" } else { " " };
        println!("{:>2}. [{mark}] {}", i + 1, item.text);
    }
    let p = exam.material_progress();
    println!("{}/{} done ({}%)", p.completed, p.total, p.percent);
    Ok(())
}
