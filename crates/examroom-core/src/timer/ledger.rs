//! Per-exam study ledger.
//!
//! The ledger is append-only: a [`Session`] is written once when a running
//! stopwatch is paused or a focus phase ends, and never touched again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::whole_secs_between;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub study_sessions: Vec<Session>,
    #[serde(default)]
    pub total_study_seconds: u64,
}

impl Ledger {
    /// Append a session covering `[start, end]` and add it to the total.
    ///
    /// Durations under one second (including a clock that ran backwards)
    /// are dropped and `None` is returned.
    pub fn record_session(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Session> {
        let seconds = whole_secs_between(start, end);
        if seconds == 0 {
            return None;
        }
        let session = Session { start, end, seconds };
        self.study_sessions.push(session.clone());
        self.total_study_seconds = self.total_study_seconds.saturating_add(seconds);
        Some(session)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.study_sessions
    }

    pub fn total_secs(&self) -> u64 {
        self.total_study_seconds
    }

    pub fn clear(&mut self) {
        self.study_sessions.clear();
        self.total_study_seconds = 0;
    }
}
