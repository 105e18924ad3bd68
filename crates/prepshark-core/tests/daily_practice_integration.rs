//! Integration tests for the daily practice loop.
//!
//! Covers paper generation and reuse, best-score attempts, the streak
//! scenario and entitlement resolution against one in-memory database.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use prepshark_core::practice::{PaperSource, StreakTransition};
use prepshark_core::question::{AnswerVisibility, Difficulty};
use prepshark_core::{
    Config, DailyPractice, Database, ExamType, NewQuestion, NewUser, PlanKey, PracticeClock,
    PracticeSize, StreakState, Subscriptions,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 4, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn question(subject: &str, i: usize) -> NewQuestion {
    NewQuestion {
        external_id: Some(format!("{subject}-{i}")),
        subject: subject.to_string(),
        chapter: "Mixed".into(),
        difficulty: Difficulty::Hard,
        text: format!("{subject} #{i}"),
        options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
        correct_index: 0,
        explanation: String::new(),
        tags: vec![],
        is_premium: false,
        is_pyq: false,
        year: None,
    }
}

fn database(per_subject: &[(&str, usize)]) -> Database {
    let db = Database::open_memory().unwrap();
    let questions: Vec<NewQuestion> = per_subject
        .iter()
        .flat_map(|(subject, n)| (0..*n).map(move |i| question(subject, i)))
        .collect();
    db.import_questions(&questions).unwrap();
    db.register_user(
        &NewUser {
            external_uid: "student".into(),
            email: "student@example.com".into(),
            name: "Student".into(),
            exam_type: ExamType::Jee,
        },
        now(),
    )
    .unwrap();
    db
}

fn full() -> Database {
    database(&[
        ("Physics", 30),
        ("Chemistry", 30),
        ("Botany", 30),
        ("Zoology", 30),
    ])
}

#[test]
fn test_paper_is_idempotent_for_both_sizes() {
    let db = full();
    let practice = DailyPractice::new(&db, &Config::default()).unwrap();

    for size in [25, 50] {
        let first = practice.paper(d(10), size, now()).unwrap();
        let second = practice.paper(d(10), size, now()).unwrap();
        assert_eq!(first.source, PaperSource::Generated);
        assert_eq!(second.source, PaperSource::Existing);
        assert_eq!(first.question_ids, second.question_ids);
        assert_eq!(first.question_ids.len(), size as usize);
        let unique: HashSet<_> = first.question_ids.iter().collect();
        assert_eq!(unique.len(), size as usize);
    }
}

#[test]
fn test_generation_is_reproducible_across_databases() {
    let a = full();
    let b = full();
    let pa = DailyPractice::new(&a, &Config::default()).unwrap();
    let pb = DailyPractice::new(&b, &Config::default()).unwrap();
    assert_eq!(
        pa.paper(d(10), 50, now()).unwrap().question_ids,
        pb.paper(d(10), 50, now()).unwrap().question_ids
    );
    assert_ne!(
        pa.paper(d(10), 50, now()).unwrap().question_ids,
        pa.paper(d(11), 50, now()).unwrap().question_ids
    );
}

#[test]
fn test_shortfall_shrinks_paper_without_error() {
    let db = database(&[("Physics", 2), ("Chemistry", 30), ("Botany", 30)]);
    let practice = DailyPractice::new(&db, &Config::default()).unwrap();
    let paper = practice.paper(d(10), 25, now()).unwrap();
    // Physics 2 of 7, Chemistry 6, Botany 6, Zoology 0 of 6.
    assert_eq!(paper.question_ids.len(), 14);
    assert_eq!(paper.source, PaperSource::Generated);
}

#[test]
fn test_empty_pool_is_not_persisted() {
    let db = database(&[]);
    let practice = DailyPractice::new(&db, &Config::default()).unwrap();
    let paper = practice.paper(d(10), 25, now()).unwrap();
    assert!(paper.question_ids.is_empty());
    assert_eq!(paper.source, PaperSource::Unpersisted);
    assert_eq!(db.paper_count(d(10), PracticeSize::Daily25).unwrap(), 0);
}

#[test]
fn test_repeated_subject_does_not_repeat_questions() {
    let db = database(&[("Physics", 40)]);
    let practice = DailyPractice::with_settings(
        &db,
        vec!["Physics".into(), "physics".into()],
        PracticeClock::default(),
        AnswerVisibility::Hidden,
    );
    let paper = practice.paper(d(10), 25, now()).unwrap();
    assert_eq!(paper.question_ids.len(), 25);
    let unique: HashSet<_> = paper.question_ids.iter().collect();
    assert_eq!(unique.len(), 25);
}

#[test]
fn test_subject_match_ignores_case() {
    let db = database(&[
        ("PHYSICS", 10),
        ("chemistry", 10),
        ("Botany", 10),
        ("zoology", 10),
    ]);
    let practice = DailyPractice::with_settings(
        &db,
        Config::default().practice.subjects,
        PracticeClock::default(),
        AnswerVisibility::Hidden,
    );
    assert_eq!(practice.paper(d(10), 25, now()).unwrap().question_ids.len(), 25);
}

#[test]
fn test_best_score_and_streak_scenario() {
    let db = full();
    let practice = DailyPractice::new(&db, &Config::default()).unwrap();
    let user = db.find_user("student").unwrap().unwrap();
    db.save_streak(
        user.id,
        &StreakState {
            current_streak: 3,
            max_streak: 3,
            last_practice_date: Some(d(10)),
        },
    )
    .unwrap();

    let day11 = practice
        .record_attempt("student", d(11), PracticeSize::Daily25, 60, now())
        .unwrap();
    assert_eq!(day11.streak_transition, StreakTransition::Continued);
    assert_eq!(day11.current_streak, 4);

    let lower = practice
        .record_attempt("student", d(11), PracticeSize::Daily25, 40, now())
        .unwrap();
    assert_eq!(lower.attempt.best_score, 60);
    assert_eq!(lower.current_streak, 4);

    let gap = practice
        .record_attempt("student", d(13), PracticeSize::Daily25, 10, now())
        .unwrap();
    assert_eq!(gap.streak_transition, StreakTransition::Reset);
    assert_eq!(gap.current_streak, 1);
    assert_eq!(gap.max_streak, 4);

    let same_day = practice
        .record_attempt("student", d(13), PracticeSize::Daily25, 20, now())
        .unwrap();
    assert_eq!(same_day.streak_transition, StreakTransition::Unchanged);
    assert_eq!(same_day.current_streak, 1);

    let stored = db.find_user("student").unwrap().unwrap().streak;
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.max_streak, 4);
    assert_eq!(stored.last_practice_date, Some(d(13)));
}

#[test]
fn test_entitlements_follow_subscription_lifecycle() {
    let db = full();
    let subscriptions = Subscriptions::new(&db);
    assert!(subscriptions
        .entitlements("student", now())
        .unwrap()
        .entitlements
        .plans
        .is_empty());

    subscriptions
        .activate("student", "CHAPTER_MOCK_COMBO", "pay_a", now() - Duration::days(400))
        .unwrap();
    subscriptions
        .activate("student", "DAILY_PRACTICE", "pay_b", now())
        .unwrap();

    let report = subscriptions.entitlements("student", now()).unwrap();
    assert_eq!(
        report.entitlements.plans.into_iter().collect::<Vec<_>>(),
        vec![PlanKey::DailyPractice]
    );
    assert!(!report.show_ads);
    assert_eq!(subscriptions.list("student").unwrap().len(), 2);
}
