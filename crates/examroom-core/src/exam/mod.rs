//! Exam records and their material checklist.

mod normalize;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::{Ledger, StudyTimer};

pub use normalize::{normalize_exam, normalize_material};

/// Opaque exam identity. New ids come from the creation timestamp in epoch
/// milliseconds, bumped until unique on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub u64);

impl ExamId {
    pub fn generate(now: DateTime<Utc>, taken: &[Exam]) -> Self {
        let mut candidate = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        while taken.iter().any(|e| e.id.0 == candidate) {
            candidate += 1;
        }
        ExamId(candidate)
    }
}

impl std::fmt::Display for ExamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ExamId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl MaterialItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent.
    pub percent: u32,
}

impl MaterialProgress {
    pub fn of(items: &[MaterialItem]) -> Self {
        let total = items.len();
        if total == 0 {
            return Self {
                completed: 0,
                total: 0,
                percent: 0,
            };
        }
        let completed = items.iter().filter(|it| it.done).count();
        let percent = ((completed as f64 / total as f64) * 100.0).round() as u32;
        Self {
            completed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: ExamId,
    pub subject: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub material: Vec<MaterialItem>,
    #[serde(default)]
    pub question_types: String,
    #[serde(flatten)]
    pub ledger: Ledger,
    /// Created lazily by the first timer command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<StudyTimer>,
}

impl Exam {
    pub fn from_draft(id: ExamId, draft: ExamDraft) -> Self {
        Self {
            id,
            subject: draft.subject,
            date: draft.date,
            time: draft.time,
            material: draft.material,
            question_types: draft.question_types,
            ledger: Ledger::default(),
            timer: None,
        }
    }

    /// Replace the user-edited fields, keeping the ledger and timer.
    pub fn apply_draft(&mut self, draft: ExamDraft) {
        self.subject = draft.subject;
        self.date = draft.date;
        self.time = draft.time;
        self.material = draft.material;
        self.question_types = draft.question_types;
    }

    /// Local wall-clock start of the exam.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn ends_at(&self, duration_minutes: u32) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(i64::from(duration_minutes))
    }

    pub fn material_progress(&self) -> MaterialProgress {
        MaterialProgress::of(&self.material)
    }

    /// The exam's timer, created with defaults on first use, alongside the
    /// ledger it writes to.
    pub fn timer_parts(&mut self) -> (&mut StudyTimer, &mut Ledger) {
        let timer = self.timer.get_or_insert_with(StudyTimer::default);
        (timer, &mut self.ledger)
    }
}

/// User-entered exam fields, validated before they touch the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDraft {
    pub subject: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub material: Vec<MaterialItem>,
    pub question_types: String,
}

impl ExamDraft {
    /// Trim text fields, drop blank checklist entries, and reject drafts
    /// missing a required field or any material.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.subject = self.subject.trim().to_string();
        self.question_types = self.question_types.trim().to_string();
        if self.subject.is_empty() {
            return Err(ValidationError::MissingField("subject"));
        }
        if self.question_types.is_empty() {
            return Err(ValidationError::MissingField("question types"));
        }
        self.material = self
            .material
            .into_iter()
            .map(|it| MaterialItem {
                text: it.text.trim().to_string(),
                done: it.done,
            })
            .filter(|it| !it.text.is_empty())
            .collect();
        if self.material.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "at least one material item is required".into(),
            ));
        }
        Ok(self)
    }
}

/// Exams ordered by start date and time; ties keep creation order.
pub fn chronological(exams: &[Exam]) -> Vec<&Exam> {
    let mut sorted: Vec<&Exam> = exams.iter().collect();
    sorted.sort_by_key(|e| (e.starts_at(), e.id));
    sorted
}
