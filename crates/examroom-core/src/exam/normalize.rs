//! Load-boundary normalization for persisted exams.
//!
//! Stored exam lists may come from older versions: material as a bare
//! string or a list of strings, instants as epoch milliseconds, flat
//! `timerRunningStart` / `pomodoro` fields instead of the `timer` union,
//! missing ledgers. Everything is upgraded here, once, so the rest of the
//! crate only ever sees a strict [`Exam`].

use chrono::{DateTime, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{Exam, MaterialItem};
use crate::timer::StudyTimer;

/// Upgrade one raw exam record. Returns `None` for records that cannot be
/// salvaged (no usable id or date).
pub fn normalize_exam(raw: Value) -> Option<Exam> {
    let Value::Object(mut obj) = raw else {
        warn!("skipping stored exam that is not an object");
        return None;
    };

    let id = match obj.get("id").and_then(as_u64) {
        Some(id) => id,
        None => {
            warn!("skipping stored exam without a usable id");
            return None;
        }
    };
    obj.insert("id".into(), json!(id));

    for key in ["subject", "questionTypes"] {
        if !obj.get(key).is_some_and(Value::is_string) {
            obj.insert(key.into(), json!(""));
        }
    }

    let time = obj
        .get("time")
        .and_then(Value::as_str)
        .and_then(parse_time)
        .unwrap_or_else(|| {
            debug!(exam = id, "stored exam has no usable time, assuming midnight");
            NaiveTime::default()
        });
    obj.insert("time".into(), json!(time));

    let material = normalize_material(obj.get("material").unwrap_or(&Value::Null));
    obj.insert("material".into(), json!(material));

    normalize_ledger(&mut obj);
    normalize_timer(id, &mut obj);

    match serde_json::from_value::<Exam>(Value::Object(obj)) {
        Ok(exam) => Some(exam),
        Err(e) => {
            warn!(exam = id, error = %e, "skipping stored exam that failed to parse");
            None
        }
    }
}

/// Coerce any stored material shape into checklist items.
pub fn normalize_material(raw: &Value) -> Vec<MaterialItem> {
    match raw {
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => vec![MaterialItem::new(s.clone())],
        Value::Array(items) => items
            .iter()
            .map(|it| match it {
                Value::String(s) => MaterialItem::new(s.clone()),
                Value::Object(o) => MaterialItem {
                    text: o
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    done: o.get("done").is_some_and(truthy),
                },
                Value::Null => MaterialItem::new(String::new()),
                other => MaterialItem::new(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_ledger(obj: &mut Map<String, Value>) {
    let sessions: Vec<Value> = match obj.remove("studySessions") {
        Some(Value::Array(items)) => items.into_iter().filter_map(normalize_session).collect(),
        _ => Vec::new(),
    };
    let total = match obj.get("totalStudySeconds") {
        Some(v) => v.as_f64().map(|n| n.max(0.0).floor() as u64).unwrap_or(0),
        None => sessions
            .iter()
            .filter_map(|s| s.get("seconds").and_then(Value::as_u64))
            .sum(),
    };
    obj.insert("studySessions".into(), Value::Array(sessions));
    obj.insert("totalStudySeconds".into(), json!(total));
}

fn normalize_session(raw: Value) -> Option<Value> {
    let start = legacy_instant(raw.get("start")?)?;
    let end = legacy_instant(raw.get("end")?)?;
    let seconds = match raw.get("seconds").and_then(Value::as_f64) {
        Some(s) => s.max(0.0).floor() as u64,
        None => crate::clock::whole_secs_between(start, end),
    };
    Some(json!({ "start": start, "end": end, "seconds": seconds }))
}

fn normalize_timer(id: u64, obj: &mut Map<String, Value>) {
    let running_start = obj.remove("timerRunningStart");
    let legacy_pomodoro = obj.remove("pomodoro");
    if let Some(timer) = obj.remove("timer") {
        match serde_json::from_value::<StudyTimer>(timer.clone()) {
            Ok(_) => {
                obj.insert("timer".into(), timer);
                return;
            }
            Err(e) if !timer.is_null() => {
                debug!(exam = id, error = %e, "dropping unreadable timer state");
            }
            Err(_) => {}
        }
    }

    let running_since = running_start.as_ref().and_then(legacy_instant);
    let pomodoro = legacy_pomodoro.as_ref().and_then(Value::as_object);
    let pomodoro_mode = pomodoro
        .and_then(|p| p.get("mode"))
        .and_then(Value::as_str)
        == Some("pomodoro");

    if pomodoro_mode {
        if running_since.is_some() {
            debug!(exam = id, "dropping stopwatch start on an exam in pomodoro mode");
        }
        let p = pomodoro.cloned().unwrap_or_default();
        let phase = match p.get("phase").and_then(Value::as_str) {
            Some(ph @ ("focus" | "short" | "long")) => ph.to_string(),
            _ => "idle".to_string(),
        };
        let clock = match p.get("phaseEnd").and_then(legacy_instant) {
            Some(ends_at) if phase != "idle" => json!({ "state": "running", "endsAt": ends_at }),
            _ => {
                let remaining = p.get("remaining").and_then(as_u64).unwrap_or(0);
                json!({ "state": "frozen", "remainingSecs": remaining })
            }
        };
        let focus_count = p.get("focusCount").and_then(as_u64).unwrap_or(0);
        obj.insert(
            "timer".into(),
            json!({
                "mode": "pomodoro",
                "phase": phase,
                "clock": clock,
                "focusCount": focus_count,
            }),
        );
    } else if pomodoro.is_some() || running_since.is_some() {
        obj.insert(
            "timer".into(),
            json!({ "mode": "stopwatch", "runningSince": running_since }),
        );
    }
}

/// `HH:MM` or `HH:MM:SS`, hours with or without a leading zero.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Epoch milliseconds or an RFC 3339 string.
fn legacy_instant(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::<Utc>::from_timestamp_millis(ms)
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}
