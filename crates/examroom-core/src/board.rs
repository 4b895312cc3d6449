//! The exam board: owned application state.
//!
//! One [`ExamBoard`] owns the exam list, the store it mirrors to, the
//! clock, the configuration, and the audio feedback. Every command
//! mutates the in-memory list and writes the whole list back before it
//! returns, so two boards over the same store are never more than one
//! tick apart.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::exam::{
    chronological, normalize_exam, Exam, ExamDraft, ExamId, MaterialItem, MaterialProgress,
};
use crate::feedback::{AudioStyle, Feedback};
use crate::storage::{Config, KvStore, EXAMS_KEY, MUTED_KEY, STYLE_KEY};
use crate::timer::format::{format_study_time, remaining_until, ExamCountdown};
use crate::timer::{
    total_elapsed, PhaseInfo, PomodoroSettings, Session, StopwatchChange, StudyTimer, TimerMode,
};

/// Something the user has to agree to before it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    DeleteExam(ExamId),
    ResetStudyTime(ExamId),
    ResetPomodoro(ExamId),
    SkipLongBreak(ExamId),
    DiscardCorruptData,
}

impl Prompt {
    pub fn message(&self) -> &'static str {
        match self {
            Prompt::DeleteExam(_) => "Are you sure you want to delete this exam?",
            Prompt::ResetStudyTime(_) => "Reset all recorded study time for this exam?",
            Prompt::ResetPomodoro(_) => "Reset the Pomodoro cycle for this exam?",
            Prompt::SkipLongBreak(_) => "Skip the long break and start focusing now?",
            Prompt::DiscardCorruptData => "Saved exam data appears corrupted. Reset saved data?",
        }
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: Prompt) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(Prompt) -> bool,
{
    fn confirm(&mut self, prompt: Prompt) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied(Vec<Event>),
    /// The command had nothing to do (already running, not running, idle).
    Unchanged,
    /// The user declined the confirmation; nothing was touched.
    Declined,
}

impl CommandOutcome {
    fn from_events(events: Vec<Event>) -> Self {
        if events.is_empty() {
            CommandOutcome::Unchanged
        } else {
            CommandOutcome::Applied(events)
        }
    }

    pub fn events(&self) -> &[Event] {
        match self {
            CommandOutcome::Applied(events) => events,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records that could not be salvaged by normalization.
    pub skipped: usize,
    /// The stored list was not a JSON array.
    pub corrupt: bool,
    /// The corrupt entry was removed from storage at the user's request.
    pub discarded: bool,
}

/// Display-ready state of one exam, recomputed every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamStatus {
    pub id: ExamId,
    pub subject: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub countdown: ExamCountdown,
    pub countdown_label: String,
    pub until_text: String,
    pub elapsed_secs: u64,
    pub elapsed_text: String,
    pub mode: Option<TimerMode>,
    pub running: bool,
    pub phase: Option<PhaseInfo>,
    pub progress: MaterialProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub at: DateTime<Utc>,
    pub statuses: Vec<ExamStatus>,
    pub events: Vec<Event>,
}

pub struct ExamBoard<S: KvStore> {
    exams: Vec<Exam>,
    store: S,
    clock: Box<dyn Clock>,
    config: Config,
    settings: PomodoroSettings,
    feedback: Feedback,
    last_tick: Option<DateTime<Utc>>,
}

impl<S: KvStore> ExamBoard<S> {
    /// Build the board and load preferences and exams from `store`.
    pub fn open(
        store: S,
        clock: impl Clock + 'static,
        config: Config,
        feedback: Feedback,
        confirm: &mut dyn Confirm,
    ) -> Result<(Self, LoadReport)> {
        let settings = config.pomodoro_settings();
        let mut board = Self {
            exams: Vec::new(),
            store,
            clock: Box::new(clock),
            config,
            settings,
            feedback,
            last_tick: None,
        };
        board.load_preferences()?;
        let report = board.load_exams(confirm)?;
        // Anything written before we opened is already loaded.
        board.store.poll_external_change()?;
        Ok((board, report))
    }

    /// Release the audio device. The board is not usable afterwards.
    pub fn shutdown(mut self) -> S {
        self.feedback.close();
        info!("exam board shut down");
        self.store
    }

    // ── Loading & persistence ────────────────────────────────────────

    /// Replace the in-memory list with the stored one.
    ///
    /// A stored value that is not a JSON array is reported to `confirm`:
    /// agreeing removes it from storage, declining leaves storage alone.
    /// Either way the board continues with an empty list.
    pub fn load_exams(&mut self, confirm: &mut dyn Confirm) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let Some(raw) = self.store.get(EXAMS_KEY)? else {
            self.exams.clear();
            return Ok(report);
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => {
                let total = items.len();
                self.exams = items.into_iter().filter_map(normalize_exam).collect();
                report.loaded = self.exams.len();
                report.skipped = total - report.loaded;
                debug!(loaded = report.loaded, skipped = report.skipped, "exams loaded");
            }
            parsed => {
                match parsed {
                    Ok(_) => warn!("saved exams is not a list"),
                    Err(e) => warn!(error = %e, "failed to parse saved exams"),
                }
                report.corrupt = true;
                self.exams.clear();
                if confirm.confirm(Prompt::DiscardCorruptData) {
                    self.store.remove(EXAMS_KEY)?;
                    report.discarded = true;
                    info!("corrupt exam data discarded");
                }
            }
        }
        Ok(report)
    }

    fn load_preferences(&mut self) -> Result<()> {
        let muted = match self.store.get(MUTED_KEY)?.as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => self.config.audio.muted,
        };
        let style = self
            .store
            .get(STYLE_KEY)?
            .and_then(|s| s.parse::<AudioStyle>().ok())
            .unwrap_or(self.config.audio.style);
        self.feedback.set_muted(muted);
        self.feedback.set_style(style);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.exams)?;
        self.store.set(EXAMS_KEY, &json)?;
        Ok(())
    }

    /// Write the list, sound the events' cues, and wrap them up.
    fn commit(&mut self, events: Vec<Event>) -> Result<CommandOutcome> {
        self.persist()?;
        for event in &events {
            if let Some(cue) = event.cue() {
                self.feedback.emit(cue);
            }
        }
        Ok(CommandOutcome::from_events(events))
    }

    /// Reload if another writer changed the store. Storage-change
    /// notifications and the tick both land here.
    pub fn sync_external(&mut self) -> Result<Option<Event>> {
        if !self.store.poll_external_change()? {
            return Ok(None);
        }
        Ok(Some(self.reload()?))
    }

    /// React to a change notification for `key` from another writer.
    pub fn handle_storage_change(&mut self, key: &str) -> Result<Option<Event>> {
        match key {
            EXAMS_KEY => Ok(Some(self.reload()?)),
            MUTED_KEY | STYLE_KEY => {
                self.load_preferences()?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn reload(&mut self) -> Result<Event> {
        // Nobody is around to answer a prompt mid-tick; keep storage as is.
        let mut keep = |_: Prompt| false;
        let report = self.load_exams(&mut keep)?;
        self.load_preferences()?;
        info!(count = report.loaded, "exams reloaded after external change");
        Ok(Event::ExamsReloaded {
            count: report.loaded,
            at: self.clock.now(),
        })
    }

    // ── Exam CRUD ────────────────────────────────────────────────────

    pub fn add_exam(&mut self, draft: ExamDraft) -> Result<ExamId> {
        let draft = draft.validated()?;
        let id = ExamId::generate(self.clock.now(), &self.exams);
        self.exams.push(Exam::from_draft(id, draft));
        self.persist()?;
        Ok(id)
    }

    /// Edit the user-entered fields; study time and timer state are kept.
    pub fn update_exam(&mut self, id: ExamId, draft: ExamDraft) -> Result<()> {
        let draft = draft.validated()?;
        self.exam_mut(id)?.apply_draft(draft);
        self.persist()
    }

    pub fn delete_exam(&mut self, id: ExamId, confirm: &mut dyn Confirm) -> Result<CommandOutcome> {
        self.exam(id)?;
        if !confirm.confirm(Prompt::DeleteExam(id)) {
            return Ok(CommandOutcome::Declined);
        }
        self.exams.retain(|e| e.id != id);
        info!(exam = %id, "exam deleted");
        let at = self.clock.now();
        self.commit(vec![Event::ExamDeleted { exam_id: id, at }])
    }

    pub fn add_material(&mut self, id: ExamId, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::MissingField("material text").into());
        }
        self.exam_mut(id)?.material.push(MaterialItem::new(text));
        self.persist()
    }

    /// Flip a checklist item; returns its new `done` state.
    pub fn toggle_material(&mut self, id: ExamId, index: usize) -> Result<bool> {
        let exam = self.exam_mut(id)?;
        let len = exam.material.len();
        let item = exam
            .material
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(index, len))?;
        item.done = !item.done;
        let done = item.done;
        self.persist()?;
        Ok(done)
    }

    pub fn remove_material(&mut self, id: ExamId, index: usize) -> Result<MaterialItem> {
        let exam = self.exam_mut(id)?;
        let len = exam.material.len();
        if index >= len {
            return Err(out_of_bounds(index, len).into());
        }
        let removed = exam.material.remove(index);
        self.persist()?;
        Ok(removed)
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start the exam's timer in whichever mode it is in.
    pub fn start(&mut self, id: ExamId) -> Result<CommandOutcome> {
        let now = self.clock.now();
        let settings = self.settings;
        let (timer, _) = self.exam_mut(id)?.timer_parts();
        let event = match timer {
            StudyTimer::Stopwatch(sw) => sw.start(now).map(|c| Event::from_stopwatch(id, c, now)),
            StudyTimer::Pomodoro(p) => p
                .start(&settings, now)
                .map(|c| Event::from_phase(id, c, false, now)),
        };
        self.commit(event.into_iter().collect())
    }

    pub fn pause(&mut self, id: ExamId) -> Result<CommandOutcome> {
        let now = self.clock.now();
        let (timer, ledger) = self.exam_mut(id)?.timer_parts();
        let event = match timer {
            StudyTimer::Stopwatch(sw) => sw
                .pause(ledger, now)
                .map(|c| Event::from_stopwatch(id, c, now)),
            StudyTimer::Pomodoro(p) => p.pause(now).map(|c| Event::from_phase(id, c, false, now)),
        };
        self.commit(event.into_iter().collect())
    }

    /// Reset in the current mode: a stopwatch loses its recorded study time,
    /// a Pomodoro cycle goes back to idle.
    pub fn reset(&mut self, id: ExamId, confirm: &mut dyn Confirm) -> Result<CommandOutcome> {
        let mode = self.exam(id)?.timer.as_ref().map(StudyTimer::mode);
        match mode {
            Some(TimerMode::Pomodoro) => {
                if !confirm.confirm(Prompt::ResetPomodoro(id)) {
                    return Ok(CommandOutcome::Declined);
                }
                let at = self.clock.now();
                if let (StudyTimer::Pomodoro(p), _) = self.exam_mut(id)?.timer_parts() {
                    p.reset();
                }
                info!(exam = %id, "pomodoro reset");
                self.commit(vec![Event::PomodoroReset { exam_id: id, at }])
            }
            _ => self.reset_study_time(id, confirm),
        }
    }

    /// Clear the ledger and stop a running stopwatch, in any mode.
    pub fn reset_study_time(&mut self, id: ExamId, confirm: &mut dyn Confirm) -> Result<CommandOutcome> {
        self.exam(id)?;
        if !confirm.confirm(Prompt::ResetStudyTime(id)) {
            return Ok(CommandOutcome::Declined);
        }
        let at = self.clock.now();
        let (timer, ledger) = self.exam_mut(id)?.timer_parts();
        match timer {
            StudyTimer::Stopwatch(sw) => sw.reset(ledger),
            StudyTimer::Pomodoro(_) => ledger.clear(),
        }
        info!(exam = %id, "study time reset");
        self.commit(vec![Event::StudyTimeReset { exam_id: id, at }])
    }

    /// End the current Pomodoro phase early. Only long breaks ask first.
    pub fn skip(&mut self, id: ExamId, confirm: &mut dyn Confirm) -> Result<CommandOutcome> {
        let now = self.clock.now();
        let settings = self.settings;
        let needs_confirmation = match &self.exam(id)?.timer {
            Some(StudyTimer::Pomodoro(p)) => p.skip_needs_confirmation(),
            _ => return Ok(CommandOutcome::Unchanged),
        };
        if needs_confirmation && !confirm.confirm(Prompt::SkipLongBreak(id)) {
            return Ok(CommandOutcome::Declined);
        }
        let (timer, ledger) = self.exam_mut(id)?.timer_parts();
        let event = match timer {
            StudyTimer::Pomodoro(p) => p
                .skip(ledger, &settings, now)
                .map(|c| Event::from_phase(id, c, false, now)),
            StudyTimer::Stopwatch(_) => None,
        };
        self.commit(event.into_iter().collect())
    }

    /// Hand the exam's clock to the other engine.
    ///
    /// Whatever runs is stopped first: a stopwatch run is recorded, a focus
    /// phase in progress is credited for the time spent. The new engine
    /// starts fresh and stopped.
    pub fn set_mode(&mut self, id: ExamId, mode: TimerMode) -> Result<CommandOutcome> {
        let now = self.clock.now();
        let settings = self.settings;
        let (timer, ledger) = self.exam_mut(id)?.timer_parts();
        if timer.mode() == mode {
            return self.commit(Vec::new());
        }
        let session = match timer {
            StudyTimer::Stopwatch(sw) => match sw.pause(ledger, now) {
                Some(StopwatchChange::Paused { session }) => session,
                _ => None,
            },
            StudyTimer::Pomodoro(p) => p.abandon(ledger, &settings, now),
        };
        *timer = StudyTimer::fresh(mode);
        self.commit(vec![Event::ModeChanged {
            exam_id: id,
            mode,
            session,
            at: now,
        }])
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.feedback.set_muted(muted);
        self.store
            .set(MUTED_KEY, if muted { "true" } else { "false" })?;
        Ok(())
    }

    pub fn set_style(&mut self, style: AudioStyle) -> Result<()> {
        self.feedback.set_style(style);
        self.store.set(STYLE_KEY, style.as_str())?;
        Ok(())
    }

    pub fn muted(&self) -> bool {
        self.feedback.muted()
    }

    pub fn style(&self) -> AudioStyle {
        self.feedback.style()
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// One periodic pass: pick up external writes, advance expired
    /// Pomodoro phases (at most one step per exam), announce exams whose
    /// start time just passed, and recompute every exam's display state.
    pub fn tick(&mut self) -> Result<TickReport> {
        let mut events = Vec::new();
        if let Some(reloaded) = self.sync_external()? {
            events.push(reloaded);
        }

        let now = self.clock.now();
        let settings = self.settings;
        let mut mutated = false;
        for exam in &mut self.exams {
            let id = exam.id;
            let Exam {
                timer: Some(StudyTimer::Pomodoro(p)),
                ledger,
                ..
            } = exam
            else {
                continue;
            };
            if !p.is_due(now) {
                continue;
            }
            if let Some(change) = p.advance(ledger, &settings, now) {
                debug!(exam = %id, ?change, "phase advanced");
                events.push(Event::from_phase(id, change, true, now));
                mutated = true;
            }
        }

        if let Some(last) = self.last_tick {
            let (from, to) = (to_local(last), to_local(now));
            for exam in &self.exams {
                let starts = exam.starts_at();
                if starts > from && starts <= to {
                    events.push(Event::ExamDue {
                        exam_id: exam.id,
                        at: now,
                    });
                }
            }
        }
        self.last_tick = Some(now);

        if mutated {
            self.persist()?;
        }
        for event in &events {
            if let Some(cue) = event.cue() {
                self.feedback.emit(cue);
            }
        }
        Ok(TickReport {
            at: now,
            statuses: self.statuses_at(now),
            events,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn exams_chronological(&self) -> Vec<&Exam> {
        chronological(&self.exams)
    }

    pub fn get(&self, id: ExamId) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == id)
    }

    /// Completed study seconds plus the live run, if any.
    pub fn elapsed(&self, id: ExamId) -> Result<u64> {
        let exam = self.exam(id)?;
        Ok(total_elapsed(
            &exam.ledger,
            exam.timer.as_ref(),
            &self.settings,
            self.clock.now(),
        ))
    }

    /// Phase, remaining seconds and cycle count; `None` unless the exam is
    /// in Pomodoro mode.
    pub fn phase_info(&self, id: ExamId) -> Result<Option<PhaseInfo>> {
        let exam = self.exam(id)?;
        Ok(match &exam.timer {
            Some(StudyTimer::Pomodoro(p)) => Some(p.info(&self.settings, self.clock.now())),
            _ => None,
        })
    }

    pub fn session_history(&self, id: ExamId) -> Result<&[Session]> {
        Ok(self.exam(id)?.ledger.sessions())
    }

    pub fn material_progress(&self, id: ExamId) -> Result<MaterialProgress> {
        Ok(self.exam(id)?.material_progress())
    }

    pub fn status(&self, id: ExamId) -> Result<ExamStatus> {
        let exam = self.exam(id)?;
        Ok(self.status_of(exam, self.clock.now()))
    }

    /// Display state of every exam, soonest first.
    pub fn statuses(&self) -> Vec<ExamStatus> {
        self.statuses_at(self.clock.now())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &PomodoroSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn exam(&self, id: ExamId) -> Result<&Exam> {
        self.get(id).ok_or(CoreError::ExamNotFound(id))
    }

    fn exam_mut(&mut self, id: ExamId) -> Result<&mut Exam> {
        self.exams
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CoreError::ExamNotFound(id))
    }

    fn statuses_at(&self, now: DateTime<Utc>) -> Vec<ExamStatus> {
        chronological(&self.exams)
            .into_iter()
            .map(|exam| self.status_of(exam, now))
            .collect()
    }

    fn status_of(&self, exam: &Exam, now: DateTime<Utc>) -> ExamStatus {
        let local_now = to_local(now);
        let starts_at = exam.starts_at();
        let countdown = ExamCountdown::between(starts_at, local_now);
        let elapsed_secs = total_elapsed(&exam.ledger, exam.timer.as_ref(), &self.settings, now);
        let phase = match &exam.timer {
            Some(StudyTimer::Pomodoro(p)) => Some(p.info(&self.settings, now)),
            _ => None,
        };
        ExamStatus {
            id: exam.id,
            subject: exam.subject.clone(),
            starts_at,
            ends_at: exam.ends_at(self.config.exam.duration_minutes),
            countdown,
            countdown_label: countdown.label(),
            until_text: remaining_until(starts_at, local_now),
            elapsed_secs,
            elapsed_text: format_study_time(elapsed_secs),
            mode: exam.timer.as_ref().map(StudyTimer::mode),
            running: exam.timer.as_ref().is_some_and(StudyTimer::is_running),
            phase,
            progress: exam.material_progress(),
        }
    }
}

fn to_local(at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&Local).naive_local()
}

fn out_of_bounds(index: usize, len: usize) -> ValidationError {
    ValidationError::OutOfBounds {
        collection: "material".into(),
        index,
        len,
    }
}
