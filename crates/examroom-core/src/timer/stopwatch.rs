//! Free-running study stopwatch.
//!
//! ```text
//! stopped --start--> running --pause--> stopped (+1 ledger session)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{Ledger, Session};
use crate::clock::whole_secs_between;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopwatch {
    /// Wall-clock instant of the last start; `None` while stopped.
    #[serde(default)]
    pub running_since: Option<DateTime<Utc>>,
}

/// What a stopwatch command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopwatchChange {
    Started,
    Paused { session: Option<Session> },
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<StopwatchChange> {
        if self.is_running() {
            return None;
        }
        self.running_since = Some(now);
        Some(StopwatchChange::Started)
    }

    /// Stop the watch and write the run into the ledger.
    pub fn pause(&mut self, ledger: &mut Ledger, now: DateTime<Utc>) -> Option<StopwatchChange> {
        let since = self.running_since.take()?;
        let session = ledger.record_session(since, now);
        Some(StopwatchChange::Paused { session })
    }

    /// Seconds of the run in progress, zero when stopped.
    pub fn live_secs(&self, now: DateTime<Utc>) -> u64 {
        self.running_since
            .map(|since| whole_secs_between(since, now))
            .unwrap_or(0)
    }

    pub fn elapsed(&self, ledger: &Ledger, now: DateTime<Utc>) -> u64 {
        ledger.total_secs() + self.live_secs(now)
    }

    /// Wipe the ledger and stop. Callers gate this behind a confirmation.
    pub fn reset(&mut self, ledger: &mut Ledger) {
        self.running_since = None;
        ledger.clear();
    }
}
