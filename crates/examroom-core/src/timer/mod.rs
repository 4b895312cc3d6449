pub mod format;
mod ledger;
mod pomodoro;
mod stopwatch;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ledger::{Ledger, Session};
pub use pomodoro::{Phase, PhaseChange, PhaseClock, PhaseInfo, PomodoroSettings, PomodoroState};
pub use stopwatch::{Stopwatch, StopwatchChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Stopwatch,
    Pomodoro,
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stopwatch" | "timer" => Ok(TimerMode::Stopwatch),
            "pomodoro" => Ok(TimerMode::Pomodoro),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

/// The engine that owns an exam's study clock.
///
/// Only one variant exists at a time, so a running stopwatch and a running
/// Pomodoro phase can never coexist on the same exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StudyTimer {
    Stopwatch(Stopwatch),
    Pomodoro(PomodoroState),
}

impl Default for StudyTimer {
    fn default() -> Self {
        StudyTimer::Stopwatch(Stopwatch::default())
    }
}

impl StudyTimer {
    pub fn fresh(mode: TimerMode) -> Self {
        match mode {
            TimerMode::Stopwatch => StudyTimer::Stopwatch(Stopwatch::default()),
            TimerMode::Pomodoro => StudyTimer::Pomodoro(PomodoroState::default()),
        }
    }

    pub fn mode(&self) -> TimerMode {
        match self {
            StudyTimer::Stopwatch(_) => TimerMode::Stopwatch,
            StudyTimer::Pomodoro(_) => TimerMode::Pomodoro,
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            StudyTimer::Stopwatch(sw) => sw.is_running(),
            StudyTimer::Pomodoro(p) => p.is_running(),
        }
    }

    /// Seconds accrued by whichever run is in progress.
    pub fn live_secs(&self, settings: &PomodoroSettings, now: DateTime<Utc>) -> u64 {
        match self {
            StudyTimer::Stopwatch(sw) => sw.live_secs(now),
            StudyTimer::Pomodoro(p) => p.live_focus_secs(settings, now),
        }
    }
}

/// Completed study time plus the live delta of a running timer.
pub fn total_elapsed(
    ledger: &Ledger,
    timer: Option<&StudyTimer>,
    settings: &PomodoroSettings,
    now: DateTime<Utc>,
) -> u64 {
    let live = timer.map(|t| t.live_secs(settings, now)).unwrap_or(0);
    ledger.total_secs().saturating_add(live)
}
