//! # Examroom Core Library
//!
//! Core logic for Examroom, an exam tracker with per-exam study timers.
//! Everything the CLI does goes through this crate; the binary is a thin
//! presentation layer over [`ExamBoard`].
//!
//! ## Architecture
//!
//! - **Timers**: a free-running stopwatch and a Pomodoro phase engine, both
//!   wall-clock based. They never count; they compare stored instants with
//!   the current time, so suspension or a restart loses nothing.
//! - **Board**: owns the exam list, writes it through to storage after
//!   every command, and drives Pomodoro phases forward on `tick()`.
//! - **Storage**: a string key-value store (SQLite on disk, or in memory)
//!   plus TOML configuration.
//! - **Scheduler**: a tokio interval that tells the caller when to tick.
//!
//! ## Key Components
//!
//! - [`ExamBoard`]: application state and commands
//! - [`StudyTimer`]: the per-exam timer, stopwatch or Pomodoro
//! - [`Database`]: persistent key-value storage
//! - [`Config`]: application configuration management

pub mod board;
pub mod clock;
pub mod error;
pub mod events;
pub mod exam;
pub mod feedback;
pub mod scheduler;
pub mod storage;
pub mod timer;

pub use board::{
    CommandOutcome, Confirm, ExamBoard, ExamStatus, LoadReport, Prompt, TickReport,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use exam::{Exam, ExamDraft, ExamId, MaterialItem, MaterialProgress};
pub use feedback::{AudioError, AudioSink, AudioStyle, Cue, Feedback, Tone};
pub use scheduler::{Tick, TickScheduler};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use timer::{Ledger, Phase, PhaseInfo, PomodoroSettings, Session, StudyTimer, TimerMode};
