use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exam::ExamId;
use crate::feedback::Cue;
use crate::timer::{Phase, PhaseChange, Session, StopwatchChange, TimerMode};

/// Every state change on the board produces an Event.
/// The presentation layer prints them; feedback cues are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StopwatchStarted {
        exam_id: ExamId,
        at: DateTime<Utc>,
    },
    StopwatchPaused {
        exam_id: ExamId,
        session: Option<Session>,
        at: DateTime<Utc>,
    },
    StudyTimeReset {
        exam_id: ExamId,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        exam_id: ExamId,
        phase: Phase,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    PhasePaused {
        exam_id: ExamId,
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        exam_id: ExamId,
        from: Phase,
        to: Phase,
        focus_count: u32,
        ends_at: DateTime<Utc>,
        session: Option<Session>,
        /// False when the user skipped the phase.
        automatic: bool,
        at: DateTime<Utc>,
    },
    PomodoroReset {
        exam_id: ExamId,
        at: DateTime<Utc>,
    },
    ModeChanged {
        exam_id: ExamId,
        mode: TimerMode,
        session: Option<Session>,
        at: DateTime<Utc>,
    },
    /// An exam's scheduled start passed while the board was ticking.
    ExamDue {
        exam_id: ExamId,
        at: DateTime<Utc>,
    },
    ExamDeleted {
        exam_id: ExamId,
        at: DateTime<Utc>,
    },
    /// The exam list was replaced by a newer copy written elsewhere.
    ExamsReloaded {
        count: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn from_stopwatch(exam_id: ExamId, change: StopwatchChange, at: DateTime<Utc>) -> Self {
        match change {
            StopwatchChange::Started => Event::StopwatchStarted { exam_id, at },
            StopwatchChange::Paused { session } => Event::StopwatchPaused {
                exam_id,
                session,
                at,
            },
        }
    }

    pub fn from_phase(
        exam_id: ExamId,
        change: PhaseChange,
        automatic: bool,
        at: DateTime<Utc>,
    ) -> Self {
        match change {
            PhaseChange::Started { phase, ends_at } => Event::PhaseStarted {
                exam_id,
                phase,
                ends_at,
                at,
            },
            PhaseChange::Paused {
                phase,
                remaining_secs,
            } => Event::PhasePaused {
                exam_id,
                phase,
                remaining_secs,
                at,
            },
            PhaseChange::Advanced {
                from,
                to,
                focus_count,
                ends_at,
                session,
            } => Event::PhaseAdvanced {
                exam_id,
                from,
                to,
                focus_count,
                ends_at,
                session,
                automatic,
                at,
            },
        }
    }

    /// The audio cue this event should sound, if any.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            Event::StopwatchStarted { .. } | Event::PhaseStarted { .. } => Some(Cue::Start),
            Event::StopwatchPaused { .. } | Event::PhasePaused { .. } => Some(Cue::Pause),
            Event::PhaseAdvanced { to, .. } if to.is_break() => Some(Cue::Break),
            Event::PhaseAdvanced { .. } => Some(Cue::Start),
            Event::ExamDue { .. } => Some(Cue::Done),
            _ => None,
        }
    }
}
