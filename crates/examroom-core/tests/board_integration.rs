//! Integration tests for the exam board.
//!
//! Drives the board through a manual clock and the shared in-memory store,
//! covering timer commands, confirmation paths, persistence and reloads
//! triggered by a second writer.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use examroom_core::{
    AudioError, AudioSink, AudioStyle, CommandOutcome, Config, CoreError, Event, ExamBoard,
    ExamDraft, ExamId, Feedback, KvStore, ManualClock, MaterialItem, MemoryStore, Phase, Prompt,
    TimerMode, Tone, ValidationError,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
}

fn draft(subject: &str) -> ExamDraft {
    ExamDraft {
        subject: subject.into(),
        date: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        material: vec![
            MaterialItem::new("Chapter 1"),
            MaterialItem::new("Chapter 2"),
            MaterialItem::new("Past papers"),
        ],
        question_types: "Multiple choice, essay".into(),
    }
}

fn yes(_: Prompt) -> bool {
    true
}

fn no(_: Prompt) -> bool {
    false
}

fn open_board(store: MemoryStore, clock: &ManualClock) -> ExamBoard<MemoryStore> {
    let (board, _) =
        ExamBoard::open(store, clock.clone(), Config::default(), Feedback::silent(), &mut yes)
            .unwrap();
    board
}

#[derive(Clone, Default)]
struct Recorder {
    cues: Arc<Mutex<Vec<usize>>>,
}

impl AudioSink for Recorder {
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        self.cues.lock().unwrap().push(tones.len());
        Ok(())
    }
}

#[test]
fn stopwatch_session_is_recorded_and_persisted() {
    let clock = ManualClock::new(t0());
    let store = MemoryStore::new();
    let observer = store.handle();
    let mut board = open_board(store, &clock);
    let id = board.add_exam(draft("Maths")).unwrap();

    let outcome = board.start(id).unwrap();
    assert!(matches!(outcome.events(), [Event::StopwatchStarted { .. }]));
    assert_eq!(board.start(id).unwrap(), CommandOutcome::Unchanged);

    clock.advance_secs(300);
    assert_eq!(board.elapsed(id).unwrap(), 300);
    board.pause(id).unwrap();
    clock.advance_secs(60);

    assert_eq!(board.elapsed(id).unwrap(), 300);
    let history = board.session_history(id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].seconds, 300);

    let stored = observer.get("exams").unwrap().unwrap();
    assert!(stored.contains("\"totalStudySeconds\":300"));
}

#[test]
fn immediate_pause_adds_no_session() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();

    board.start(id).unwrap();
    board.pause(id).unwrap();
    assert!(board.session_history(id).unwrap().is_empty());
    assert_eq!(board.elapsed(id).unwrap(), 0);
}

#[test]
fn full_focus_phase_moves_to_short_break() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Chemistry")).unwrap();

    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(1500);
    let report = board.tick().unwrap();

    assert!(report.events.iter().any(|e| matches!(
        e,
        Event::PhaseAdvanced {
            from: Phase::Focus,
            to: Phase::Short,
            automatic: true,
            ..
        }
    )));
    let info = board.phase_info(id).unwrap().unwrap();
    assert_eq!(info.phase, Phase::Short);
    assert_eq!(info.focus_count, 1);
    assert_eq!(info.remaining_secs, 300);
    assert_eq!(board.session_history(id).unwrap()[0].seconds, 1500);
    assert_eq!(board.elapsed(id).unwrap(), 1500);
}

#[test]
fn every_fourth_focus_earns_a_long_break() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Biology")).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();

    let mut breaks = Vec::new();
    for _ in 0..4 {
        clock.advance_secs(1500);
        board.tick().unwrap();
        breaks.push(board.phase_info(id).unwrap().unwrap().phase);
        let remaining = board.phase_info(id).unwrap().unwrap().remaining_secs;
        clock.advance_secs(remaining as i64);
        board.tick().unwrap();
    }
    assert_eq!(breaks, vec![Phase::Short, Phase::Short, Phase::Short, Phase::Long]);
    assert_eq!(board.elapsed(id).unwrap(), 4 * 1500);
}

#[test]
fn skipping_long_break_needs_confirmation() {
    let clock = ManualClock::new(t0());
    let mut config = Config::default();
    config.pomodoro.cycles_before_long_break = 1;
    let (mut board, _) =
        ExamBoard::open(MemoryStore::new(), clock.clone(), config, Feedback::silent(), &mut yes)
            .unwrap();
    let id = board.add_exam(draft("History")).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(1500);
    board.tick().unwrap();
    assert_eq!(board.phase_info(id).unwrap().unwrap().phase, Phase::Long);

    let mut asked = Vec::new();
    let outcome = board
        .skip(id, &mut |p: Prompt| {
            asked.push(p);
            false
        })
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Declined);
    assert_eq!(asked, vec![Prompt::SkipLongBreak(id)]);
    assert_eq!(board.phase_info(id).unwrap().unwrap().phase, Phase::Long);

    board.skip(id, &mut yes).unwrap();
    assert_eq!(board.phase_info(id).unwrap().unwrap().phase, Phase::Focus);
}

#[test]
fn skipping_short_break_does_not_ask() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("History")).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(1500);
    board.tick().unwrap();

    let outcome = board.skip(id, &mut no).unwrap();
    assert!(matches!(
        outcome.events(),
        [Event::PhaseAdvanced {
            to: Phase::Focus,
            automatic: false,
            ..
        }]
    ));
}

#[test]
fn skip_in_stopwatch_mode_is_a_no_op() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Art")).unwrap();
    assert_eq!(board.skip(id, &mut yes).unwrap(), CommandOutcome::Unchanged);
}

#[test]
fn switching_mode_credits_partial_focus() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Physics")).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(600);

    let outcome = board.set_mode(id, TimerMode::Stopwatch).unwrap();
    match outcome.events() {
        [Event::ModeChanged {
            mode: TimerMode::Stopwatch,
            session: Some(session),
            ..
        }] => assert_eq!(session.seconds, 600),
        other => panic!("unexpected events: {other:?}"),
    }
    assert!(board.phase_info(id).unwrap().is_none());
    assert_eq!(board.elapsed(id).unwrap(), 600);
    assert!(!board.get(id).unwrap().timer.as_ref().unwrap().is_running());
}

#[test]
fn switching_mode_records_running_stopwatch() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Physics")).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(90);
    board.set_mode(id, TimerMode::Pomodoro).unwrap();

    assert_eq!(board.session_history(id).unwrap().len(), 1);
    let info = board.phase_info(id).unwrap().unwrap();
    assert_eq!(info.phase, Phase::Idle);
    assert_eq!(info.remaining_secs, 1500);
}

#[test]
fn reset_requires_confirmation() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(120);
    board.pause(id).unwrap();

    assert_eq!(board.reset(id, &mut no).unwrap(), CommandOutcome::Declined);
    assert_eq!(board.elapsed(id).unwrap(), 120);

    let outcome = board.reset(id, &mut yes).unwrap();
    assert!(matches!(outcome.events(), [Event::StudyTimeReset { .. }]));
    assert_eq!(board.elapsed(id).unwrap(), 0);
    assert!(board.session_history(id).unwrap().is_empty());
}

#[test]
fn pomodoro_reset_keeps_study_time() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(1500);
    board.tick().unwrap();

    let outcome = board.reset(id, &mut yes).unwrap();
    assert!(matches!(outcome.events(), [Event::PomodoroReset { .. }]));
    let info = board.phase_info(id).unwrap().unwrap();
    assert_eq!(info.phase, Phase::Idle);
    assert_eq!(info.focus_count, 0);
    assert_eq!(board.elapsed(id).unwrap(), 1500);
}

#[test]
fn delete_honours_the_answer() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();

    assert_eq!(board.delete_exam(id, &mut no).unwrap(), CommandOutcome::Declined);
    assert!(board.get(id).is_some());
    board.delete_exam(id, &mut yes).unwrap();
    assert!(board.get(id).is_none());
    assert!(matches!(board.start(id), Err(CoreError::ExamNotFound(missing)) if missing == id));
}

#[test]
fn material_checklist_commands() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();

    assert!(board.toggle_material(id, 0).unwrap());
    let progress = board.material_progress(id).unwrap();
    assert_eq!((progress.completed, progress.total, progress.percent), (1, 3, 33));

    board.add_material(id, "  Formula sheet ").unwrap();
    assert_eq!(board.get(id).unwrap().material[3].text, "Formula sheet");

    let removed = board.remove_material(id, 1).unwrap();
    assert_eq!(removed.text, "Chapter 2");
    assert!(matches!(
        board.toggle_material(id, 9),
        Err(CoreError::Validation(ValidationError::OutOfBounds { index: 9, len: 3, .. }))
    ));
}

#[test]
fn editing_keeps_study_time() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Maths")).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(45);
    board.pause(id).unwrap();

    let mut edited = draft("Further Maths");
    edited.time = NaiveTime::from_hms_opt(13, 30, 0).unwrap();
    board.update_exam(id, edited).unwrap();

    let exam = board.get(id).unwrap();
    assert_eq!(exam.subject, "Further Maths");
    assert_eq!(exam.ledger.total_secs(), 45);

    let mut invalid = draft("Maths");
    invalid.question_types = "  ".into();
    assert!(board.update_exam(id, invalid).is_err());
    assert_eq!(board.get(id).unwrap().subject, "Further Maths");
}

#[test]
fn second_board_reloads_on_tick() {
    let clock = ManualClock::new(t0());
    let store = MemoryStore::new();
    let other = store.handle();
    let mut first = open_board(store, &clock);
    let mut second = open_board(other, &clock);

    let id = first.add_exam(draft("Geography")).unwrap();
    first.start(id).unwrap();
    clock.advance_secs(30);

    let report = second.tick().unwrap();
    assert!(matches!(
        report.events.first(),
        Some(Event::ExamsReloaded { count: 1, .. })
    ));
    assert_eq!(second.elapsed(id).unwrap(), 30);
    assert!(report.statuses[0].running);

    // Nothing changed since; the next tick does not reload again.
    let report = second.tick().unwrap();
    assert!(report.events.is_empty());
}

#[test]
fn corrupt_data_discarded_only_when_confirmed() {
    let clock = ManualClock::new(t0());
    let mut store = MemoryStore::new();
    store.set("exams", "{not json").unwrap();
    let observer = store.handle();

    let (board, report) = ExamBoard::open(
        store.handle(),
        clock.clone(),
        Config::default(),
        Feedback::silent(),
        &mut no,
    )
    .unwrap();
    assert!(report.corrupt);
    assert!(!report.discarded);
    assert!(board.exams().is_empty());
    assert_eq!(observer.get("exams").unwrap().as_deref(), Some("{not json"));

    let mut asked = Vec::new();
    let (_, report) = ExamBoard::open(
        store,
        clock.clone(),
        Config::default(),
        Feedback::silent(),
        &mut |p: Prompt| {
            asked.push(p);
            true
        },
    )
    .unwrap();
    assert_eq!(asked, vec![Prompt::DiscardCorruptData]);
    assert!(report.discarded);
    assert!(observer.get("exams").unwrap().is_none());
}

#[test]
fn corrupt_external_write_leaves_storage_alone() {
    let clock = ManualClock::new(t0());
    let store = MemoryStore::new();
    let mut writer = store.handle();
    let observer = store.handle();
    let mut board = open_board(store, &clock);
    board.add_exam(draft("Maths")).unwrap();

    writer.set("exams", "42").unwrap();
    let report = board.tick().unwrap();
    assert!(matches!(
        report.events.first(),
        Some(Event::ExamsReloaded { count: 0, .. })
    ));
    assert!(board.exams().is_empty());
    assert_eq!(observer.get("exams").unwrap().as_deref(), Some("42"));
}

#[test]
fn legacy_records_are_upgraded_on_load() {
    let clock = ManualClock::new(t0());
    let mut store = MemoryStore::new();
    store
        .set(
            "exams",
            r#"[
                {"id": 1714550400000, "subject": "Latin", "date": "2026-06-20",
                 "time": "09:30", "material": "Unit 3", "questionTypes": "Translation",
                 "studySessions": [{"start": 1714550400000, "end": 1714551000000, "seconds": 600}],
                 "totalStudySeconds": 600,
                 "pomodoro": {"mode": "pomodoro", "phase": "short", "remaining": 120, "focusCount": 1}},
                {"subject": "No id"}
            ]"#,
        )
        .unwrap();

    let (board, report) =
        ExamBoard::open(store, clock.clone(), Config::default(), Feedback::silent(), &mut no)
            .unwrap();
    assert_eq!((report.loaded, report.skipped), (1, 1));

    let id = ExamId(1_714_550_400_000);
    let exam = board.get(id).unwrap();
    assert_eq!(exam.time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert_eq!(exam.material, vec![MaterialItem::new("Unit 3")]);
    assert_eq!(board.elapsed(id).unwrap(), 600);
    let info = board.phase_info(id).unwrap().unwrap();
    assert_eq!(info.phase, Phase::Short);
    assert_eq!(info.remaining_secs, 120);
    assert!(!info.running);
}

#[test]
fn exam_due_fires_once_when_start_passes() {
    let clock = ManualClock::new(t0());
    let local = t0().with_timezone(&Local).naive_local() + Duration::seconds(90);
    let mut exam = draft("Music");
    exam.date = local.date();
    exam.time = local.time();

    let recorder = Recorder::default();
    let sink = recorder.clone();
    let feedback = Feedback::acquire(move || Ok(Box::new(sink) as Box<dyn AudioSink>));
    let (mut board, _) =
        ExamBoard::open(MemoryStore::new(), clock.clone(), Config::default(), feedback, &mut yes)
            .unwrap();
    let id = board.add_exam(exam).unwrap();

    assert!(board.tick().unwrap().events.is_empty());
    clock.advance_secs(60);
    assert!(board.tick().unwrap().events.is_empty());
    clock.advance_secs(60);
    let events = board.tick().unwrap().events;
    assert!(matches!(events.as_slice(), [Event::ExamDue { exam_id, .. }] if *exam_id == id));
    assert_eq!(recorder.cues.lock().unwrap().len(), 1);

    clock.advance_secs(60);
    assert!(board.tick().unwrap().events.is_empty());
}

#[test]
fn muted_board_plays_nothing_and_remembers() {
    let clock = ManualClock::new(t0());
    let store = MemoryStore::new();
    let reopened = store.handle();

    let recorder = Recorder::default();
    let sink = recorder.clone();
    let feedback = Feedback::acquire(move || Ok(Box::new(sink) as Box<dyn AudioSink>));
    let (mut board, _) =
        ExamBoard::open(store, clock.clone(), Config::default(), feedback, &mut yes).unwrap();
    let id = board.add_exam(draft("Maths")).unwrap();

    board.start(id).unwrap();
    assert_eq!(recorder.cues.lock().unwrap().len(), 1);

    board.set_muted(true).unwrap();
    board.set_style(AudioStyle::Soft).unwrap();
    board.pause(id).unwrap();
    assert_eq!(recorder.cues.lock().unwrap().len(), 1);
    board.shutdown();

    let board = open_board(reopened, &clock);
    assert!(board.muted());
    assert_eq!(board.style(), AudioStyle::Soft);
}

#[test]
fn statuses_are_chronological() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let mut late = draft("Late");
    late.date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    board.add_exam(late).unwrap();
    board.add_exam(draft("Early")).unwrap();

    let statuses = board.statuses();
    let subjects: Vec<&str> = statuses.iter().map(|s| s.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Early", "Late"]);
    assert_eq!(statuses[0].elapsed_text, "0s");
    assert_eq!(statuses[0].progress.total, 3);
}

#[test]
fn storage_change_notification_reloads_preferences() {
    let clock = ManualClock::new(t0());
    let store = MemoryStore::new();
    let mut writer = store.handle();
    let mut board = open_board(store, &clock);
    assert!(!board.muted());

    writer.set("soundMuted", "true").unwrap();
    assert!(board.handle_storage_change("soundMuted").unwrap().is_none());
    assert!(board.muted());

    writer.set("exams", "[]").unwrap();
    assert!(matches!(
        board.handle_storage_change("exams").unwrap(),
        Some(Event::ExamsReloaded { count: 0, .. })
    ));
    assert!(board.handle_storage_change("unrelated").unwrap().is_none());
}

#[test]
fn exam_with_unreadable_timer_survives_write_through() {
    let clock = ManualClock::new(t0());
    let mut store = MemoryStore::new();
    store
        .set(
            "exams",
            r#"[{"id": 7, "subject": "Physics", "date": "2026-06-10", "time": "09:30:00",
                 "material": [{"text": "Optics", "done": false}], "questionTypes": "Essay",
                 "studySessions": [], "totalStudySeconds": 3600,
                 "timer": {"mode": "pomodoro", "phase": "bogus"}}]"#,
        )
        .unwrap();
    let observer = store.handle();

    let (mut board, report) =
        ExamBoard::open(store, clock.clone(), Config::default(), Feedback::silent(), &mut no)
            .unwrap();
    assert_eq!((report.loaded, report.skipped), (1, 0));
    assert_eq!(board.elapsed(ExamId(7)).unwrap(), 3600);
    assert!(board.get(ExamId(7)).unwrap().timer.is_none());

    board.add_exam(draft("Other")).unwrap();
    let stored = observer.get("exams").unwrap().unwrap();
    assert!(stored.contains("Physics"));
    assert!(stored.contains("\"totalStudySeconds\":3600"));
}

#[test]
fn stored_exam_reloads_identically() {
    let clock = ManualClock::new(t0());
    let mut board = open_board(MemoryStore::new(), &clock);
    let id = board.add_exam(draft("Geography")).unwrap();

    board.start(id).unwrap();
    clock.advance_secs(420);
    board.pause(id).unwrap();
    board.set_mode(id, TimerMode::Pomodoro).unwrap();
    board.start(id).unwrap();
    clock.advance_secs(200);
    board.pause(id).unwrap();
    board.toggle_material(id, 0).unwrap();
    board.toggle_material(id, 2).unwrap();

    let exam = board.get(id).unwrap().clone();
    assert_eq!(exam.ledger.sessions().len(), 1);
    assert!(exam.timer.is_some());

    let stored = serde_json::to_value(&exam).unwrap();
    let reloaded = examroom_core::exam::normalize_exam(stored).unwrap();
    assert_eq!(reloaded, exam);
}
