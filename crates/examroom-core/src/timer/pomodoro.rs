//! Pomodoro phase engine.
//!
//! A per-exam, wall-clock-based state machine. Like the stopwatch it owns
//! no thread: the board's tick calls [`PomodoroState::is_due`] and then
//! [`PomodoroState::advance`] once a phase deadline has passed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Focus -> (Short | Long) -> Focus -> ...
//! ```
//!
//! The branch to `Long` happens on every `cycles_before_long_break`-th
//! completed focus phase.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{Ledger, Session};
use crate::clock::ceil_secs_until;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Focus,
    Short,
    Long,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Phase::Short | Phase::Long)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Focus => "Focus",
            Phase::Short => "Short Break",
            Phase::Long => "Long Break",
        }
    }
}

/// The live countdown source for the current phase.
///
/// Either a deadline is ticking, or the remaining seconds are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PhaseClock {
    Running {
        #[serde(rename = "endsAt")]
        ends_at: DateTime<Utc>,
    },
    Frozen {
        #[serde(rename = "remainingSecs")]
        remaining_secs: u64,
    },
}

impl Default for PhaseClock {
    fn default() -> Self {
        PhaseClock::Frozen { remaining_secs: 0 }
    }
}

/// Phase lengths in seconds. Global, not per exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroSettings {
    pub focus_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub cycles_before_long_break: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 20 * 60,
            cycles_before_long_break: 4,
        }
    }
}

impl PomodoroSettings {
    pub fn duration_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Idle => 0,
            Phase::Focus => self.focus_secs,
            Phase::Short => self.short_break_secs,
            Phase::Long => self.long_break_secs,
        }
    }

    /// Which break follows the `focus_count`-th completed focus phase.
    pub fn break_after(&self, focus_count: u32) -> Phase {
        let cycles = self.cycles_before_long_break.max(1);
        if focus_count > 0 && focus_count % cycles == 0 {
            Phase::Long
        } else {
            Phase::Short
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub clock: PhaseClock,
    /// Completed focus phases; drives the long-break cadence.
    #[serde(default)]
    pub focus_count: u32,
}

/// What a Pomodoro command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseChange {
    Started {
        phase: Phase,
        ends_at: DateTime<Utc>,
    },
    Paused {
        phase: Phase,
        remaining_secs: u64,
    },
    Advanced {
        from: Phase,
        to: Phase,
        focus_count: u32,
        ends_at: DateTime<Utc>,
        session: Option<Session>,
    },
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInfo {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub running: bool,
    pub focus_count: u32,
}

impl PomodoroState {
    pub fn is_running(&self) -> bool {
        matches!(self.clock, PhaseClock::Running { .. })
    }

    /// True once a running phase has reached its deadline.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.clock {
            PhaseClock::Running { ends_at } => ends_at <= now,
            PhaseClock::Frozen { .. } => false,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.clock {
            PhaseClock::Running { ends_at } => ceil_secs_until(now, ends_at),
            PhaseClock::Frozen { remaining_secs } => remaining_secs,
        }
    }

    pub fn info(&self, settings: &PomodoroSettings, now: DateTime<Utc>) -> PhaseInfo {
        let remaining_secs = if self.phase == Phase::Idle {
            settings.focus_secs
        } else {
            self.remaining_secs(now)
        };
        PhaseInfo {
            phase: self.phase,
            remaining_secs,
            running: self.is_running(),
            focus_count: self.focus_count,
        }
    }

    /// Focus seconds accrued by the phase in progress while it is running.
    pub fn live_focus_secs(&self, settings: &PomodoroSettings, now: DateTime<Utc>) -> u64 {
        if self.phase == Phase::Focus && self.is_running() {
            settings.focus_secs.saturating_sub(self.remaining_secs(now))
        } else {
            0
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, settings: &PomodoroSettings, now: DateTime<Utc>) -> Option<PhaseChange> {
        if self.phase == Phase::Idle {
            self.phase = Phase::Focus;
            self.clock = PhaseClock::Frozen {
                remaining_secs: settings.focus_secs,
            };
        }
        match self.clock {
            PhaseClock::Running { .. } => None,
            PhaseClock::Frozen { remaining_secs } => {
                let ends_at = now + secs(remaining_secs);
                self.clock = PhaseClock::Running { ends_at };
                Some(PhaseChange::Started {
                    phase: self.phase,
                    ends_at,
                })
            }
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<PhaseChange> {
        let PhaseClock::Running { ends_at } = self.clock else {
            return None;
        };
        let remaining_secs = ceil_secs_until(now, ends_at);
        self.clock = PhaseClock::Frozen { remaining_secs };
        Some(PhaseChange::Paused {
            phase: self.phase,
            remaining_secs,
        })
    }

    /// Back to a fresh idle cycle. Callers gate this behind a confirmation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Skipping a long break is a larger context switch than a short one
    /// and needs the user's explicit agreement.
    pub fn skip_needs_confirmation(&self) -> bool {
        self.phase == Phase::Long
    }

    /// Finish the current phase early. Skipping focus finalizes it exactly
    /// as natural completion would.
    pub fn skip(
        &mut self,
        ledger: &mut Ledger,
        settings: &PomodoroSettings,
        now: DateTime<Utc>,
    ) -> Option<PhaseChange> {
        self.advance(ledger, settings, now)
    }

    /// Leave the current phase and start the next one at `now`.
    ///
    /// A focus phase is credited `focus - remaining`, where remaining is the
    /// frozen snapshot or, for a running phase, what was left at
    /// `min(now, ends_at)`. Time past the deadline is never credited, so a
    /// long suspension counts as idle.
    pub fn advance(
        &mut self,
        ledger: &mut Ledger,
        settings: &PomodoroSettings,
        now: DateTime<Utc>,
    ) -> Option<PhaseChange> {
        let from = self.phase;
        let (to, session) = match from {
            Phase::Idle => return None,
            Phase::Focus => {
                let session = self.credit_focus(ledger, settings, now);
                self.focus_count = self.focus_count.saturating_add(1);
                (settings.break_after(self.focus_count), session)
            }
            Phase::Short | Phase::Long => (Phase::Focus, None),
        };
        let ends_at = now + secs(settings.duration_secs(to));
        self.phase = to;
        self.clock = PhaseClock::Running { ends_at };
        Some(PhaseChange::Advanced {
            from,
            to,
            focus_count: self.focus_count,
            ends_at,
            session,
        })
    }

    /// Credit a focus phase that is being abandoned (mode switch) without
    /// moving the cycle forward.
    pub fn abandon(
        &mut self,
        ledger: &mut Ledger,
        settings: &PomodoroSettings,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        let session = if self.phase == Phase::Focus {
            self.credit_focus(ledger, settings, now)
        } else {
            None
        };
        self.reset();
        session
    }

    fn credit_focus(
        &self,
        ledger: &mut Ledger,
        settings: &PomodoroSettings,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        let (end, remaining) = match self.clock {
            PhaseClock::Running { ends_at } => {
                let end = now.min(ends_at);
                (end, ceil_secs_until(end, ends_at))
            }
            PhaseClock::Frozen { remaining_secs } => (now, remaining_secs),
        };
        let elapsed = settings.focus_secs.saturating_sub(remaining);
        ledger.record_session(end - secs(elapsed), end)
    }
}

fn secs(s: u64) -> Duration {
    Duration::seconds(i64::try_from(s).unwrap_or(i64::MAX / 1000))
}
