//! Display helpers for durations and exam countdowns.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Format seconds as "HH:MM:SS".
pub fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Format seconds as "MM:SS" (for phase countdowns; minutes may exceed 59).
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Compact study-time label: "1h 05m", "12m 30s" or "45s".
pub fn format_study_time(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// "h:MM AM/PM" display of a time of day.
pub fn format_time_12h(time: NaiveTime) -> String {
    let hour = time.hour();
    let ampm = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display, time.minute(), ampm)
}

/// Coarse "how far away is the exam" badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum ExamCountdown {
    Past,
    Today,
    Tomorrow,
    InDays(i64),
}

impl ExamCountdown {
    /// Classify an exam start against `now`, both in local wall time.
    ///
    /// An exam that already started is `Past`; otherwise the distance is
    /// counted in calendar days, so an exam later tonight is `Today`.
    pub fn between(exam_start: NaiveDateTime, now: NaiveDateTime) -> Self {
        if exam_start < now {
            return ExamCountdown::Past;
        }
        match (exam_start.date() - now.date()).num_days() {
            0 => ExamCountdown::Today,
            1 => ExamCountdown::Tomorrow,
            n => ExamCountdown::InDays(n),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ExamCountdown::Past => "Past".to_string(),
            ExamCountdown::Today => "Today!".to_string(),
            ExamCountdown::Tomorrow => "Tomorrow".to_string(),
            ExamCountdown::InDays(n) => format!("{n} days"),
        }
    }
}

/// Remaining time until the exam starts: "2d 03h 15m", "3h 05m", "12m 09s",
/// or "started" once it is under way.
pub fn remaining_until(exam_start: NaiveDateTime, now: NaiveDateTime) -> String {
    let left = exam_start - now;
    if left <= Duration::zero() {
        return "started".to_string();
    }
    let secs = left.num_seconds() as u64;
    let d = secs / 86_400;
    let h = (secs % 86_400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if d > 0 {
        format!("{d}d {h:02}h {m:02}m")
    } else if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m {s:02}s")
    }
}
