//! Daily practice flow over the database: fetch today's paper, record a
//! submission, report status.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    get_or_create_paper, AttemptSubmission, DailyPracticeAttempt, PaperOutcome, PracticeSize,
    RecordOutcome, StreakTransition,
};
use crate::clock::PracticeClock;
use crate::error::{CoreError, Result};
use crate::question::{AnswerVisibility, QuestionPool, QuestionSummary};
use crate::storage::{Config, Database};
use crate::user::User;

/// Reply to a practice submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    #[serde(flatten)]
    pub attempt: RecordOutcome,
    pub current_streak: u32,
    pub max_streak: u32,
    pub is_attempted_today: bool,
    pub streak_transition: StreakTransition,
}

/// A user's practice state for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatus {
    pub date: NaiveDate,
    pub is_attempted_today: bool,
    pub attempted_sizes: BTreeSet<PracticeSize>,
    pub current_streak: u32,
    pub max_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
}

pub struct DailyPractice<'a> {
    db: &'a Database,
    subjects: Vec<String>,
    clock: PracticeClock,
    visibility: AnswerVisibility,
}

impl<'a> DailyPractice<'a> {
    /// # Errors
    /// Returns an error if the configured offset is invalid.
    pub fn new(db: &'a Database, config: &Config) -> Result<Self> {
        Ok(Self::with_settings(
            db,
            config.practice.subjects.clone(),
            config.clock()?,
            config.answer_visibility(),
        ))
    }

    pub fn with_settings(
        db: &'a Database,
        subjects: Vec<String>,
        clock: PracticeClock,
        visibility: AnswerVisibility,
    ) -> Self {
        Self {
            db,
            subjects,
            clock,
            visibility,
        }
    }

    pub fn clock(&self) -> PracticeClock {
        self.clock
    }

    /// The paper for (date, size), generating it on first request.
    ///
    /// # Errors
    /// Returns a validation error if `size` is not 25 or 50.
    pub fn paper(&self, date: NaiveDate, size: i64, now: DateTime<Utc>) -> Result<PaperOutcome> {
        let size = PracticeSize::try_from(size)?;
        Ok(get_or_create_paper(
            self.db,
            self.db,
            &self.subjects,
            date,
            size,
            now,
        )?)
    }

    /// List-view questions of the paper for (date, size), in paper order.
    pub fn paper_questions(
        &self,
        date: NaiveDate,
        size: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuestionSummary>> {
        let paper = self.paper(date, size, now)?;
        let questions = self.db.questions_by_ids(&paper.question_ids)?;
        Ok(questions
            .iter()
            .map(|q| QuestionSummary::from_question(q, self.visibility))
            .collect())
    }

    pub fn todays_paper(&self, size: i64, now: DateTime<Utc>) -> Result<Vec<QuestionSummary>> {
        self.paper_questions(self.clock.today(now), size, now)
    }

    fn user(db: &Database, user_uid: &str) -> Result<User> {
        db.find_user(user_uid)?
            .ok_or_else(|| CoreError::not_found("user", user_uid))
    }

    /// Record a completed paper for `date`, keeping the best score, and
    /// advance the streak on the user's first completed paper of that day.
    ///
    /// The whole read-modify-write runs in one immediate transaction, so
    /// concurrent submissions for the same user serialize.
    pub fn record_attempt(
        &self,
        user_uid: &str,
        date: NaiveDate,
        size: PracticeSize,
        score: i32,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        self.db.immediate(|db| {
            let user = Self::user(db, user_uid)?;
            let first_today = db.attempted_sizes(user.id, date)?.is_empty();

            let attempt = match db.find_attempt(user.id, date, size)? {
                None => {
                    db.insert_attempt(user.id, date, size, score, now)?;
                    RecordOutcome {
                        created: true,
                        best_score: score,
                    }
                }
                Some(existing) => match existing.improved_score(score) {
                    Some(best) => {
                        db.update_attempt_score(existing.id, best)?;
                        RecordOutcome {
                            created: false,
                            best_score: best,
                        }
                    }
                    None => {
                        tracing::debug!(
                            user = user_uid,
                            %date,
                            %size,
                            submitted = score,
                            best = existing.score,
                            "discarding score below best"
                        );
                        RecordOutcome {
                            created: false,
                            best_score: existing.score,
                        }
                    }
                },
            };

            let mut streak = user.streak;
            let streak_transition = if first_today {
                streak.advance(date)
            } else {
                StreakTransition::Unchanged
            };
            if streak_transition != StreakTransition::Unchanged {
                db.save_streak(user.id, &streak)?;
                tracing::debug!(
                    user = user_uid,
                    %date,
                    transition = ?streak_transition,
                    current = streak.current_streak,
                    max = streak.max_streak,
                    "streak advanced"
                );
            }

            Ok(SubmitOutcome {
                attempt,
                current_streak: streak.current_streak,
                max_streak: streak.max_streak,
                is_attempted_today: true,
                streak_transition,
            })
        })
    }

    /// Validate a client submission and record it against today.
    pub fn submit(
        &self,
        user_uid: &str,
        submission: &AttemptSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        let (size, score) = submission.validate()?;
        self.record_attempt(user_uid, self.clock.today(now), size, score, now)
    }

    pub fn status(&self, user_uid: &str, now: DateTime<Utc>) -> Result<DailyStatus> {
        let today = self.clock.today(now);
        let user = Self::user(self.db, user_uid)?;
        let attempted_sizes = self.db.attempted_sizes(user.id, today)?;
        Ok(DailyStatus {
            date: today,
            is_attempted_today: !attempted_sizes.is_empty(),
            attempted_sizes,
            current_streak: user.streak.current_streak,
            max_streak: user.streak.max_streak,
            last_practice_date: user.streak.last_practice_date,
        })
    }

    /// Every attempt by the user, newest date first.
    pub fn history(&self, user_uid: &str) -> Result<Vec<DailyPracticeAttempt>> {
        let user = Self::user(self.db, user_uid)?;
        Ok(self.db.attempts_for_user(user.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::practice::PaperSource;
    use crate::question::{Difficulty, NewQuestion};
    use crate::user::{ExamType, NewUser};
    use chrono::TimeZone;

    // 2024-01-10 20:00 UTC is already 2024-01-11 in IST.
    fn late_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn setup() -> Database {
        let db = Database::open_memory().unwrap();
        db.register_user(
            &NewUser {
                external_uid: "u1".into(),
                email: "u1@example.com".into(),
                name: "Meera".into(),
                exam_type: ExamType::Neet,
            },
            late_evening(),
        )
        .unwrap();
        let mut questions = Vec::new();
        for subject in ["Physics", "Chemistry", "Botany", "Zoology"] {
            for i in 0..15 {
                questions.push(NewQuestion {
                    external_id: Some(format!("{subject}-{i}")),
                    subject: subject.into(),
                    chapter: "General".into(),
                    difficulty: Difficulty::Medium,
                    text: format!("{subject} question {i}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_index: 2,
                    explanation: "because".into(),
                    tags: vec![],
                    is_premium: false,
                    is_pyq: false,
                    year: None,
                });
            }
        }
        db.import_questions(&questions).unwrap();
        db
    }

    fn practice(db: &Database) -> DailyPractice<'_> {
        DailyPractice::new(db, &Config::default()).unwrap()
    }

    #[test]
    fn paper_rejects_unsupported_size() {
        let db = setup();
        let err = practice(&db).paper(d(10), 30, late_evening()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidPracticeSize(30))
        ));
    }

    #[test]
    fn todays_paper_uses_project_timezone_and_hides_answers() {
        let db = setup();
        let service = practice(&db);
        let questions = service.todays_paper(25, late_evening()).unwrap();
        assert_eq!(questions.len(), 25);
        assert!(questions.iter().all(|q| q.correct_index.is_none()));

        let pinned = service.paper(d(11), 25, late_evening()).unwrap();
        assert_eq!(pinned.source, PaperSource::Existing);
        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, pinned.question_ids);
    }

    #[test]
    fn exposed_visibility_includes_answers() {
        let db = setup();
        let service = DailyPractice::with_settings(
            &db,
            vec!["Physics".into()],
            PracticeClock::default(),
            AnswerVisibility::Exposed,
        );
        let questions = service.paper_questions(d(10), 25, late_evening()).unwrap();
        assert_eq!(questions.len(), 15);
        assert!(questions.iter().all(|q| q.correct_index == Some(2)));
    }

    #[test]
    fn best_score_wins() {
        let db = setup();
        let service = practice(&db);
        let first = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, 60, late_evening())
            .unwrap();
        assert!(first.attempt.created);

        let lower = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, 40, late_evening())
            .unwrap();
        assert!(!lower.attempt.created);
        assert_eq!(lower.attempt.best_score, 60);

        let higher = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, 80, late_evening())
            .unwrap();
        assert_eq!(higher.attempt.best_score, 80);
        let stored = db
            .find_attempt(1, d(10), PracticeSize::Daily25)
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, 80);
    }

    #[test]
    fn negative_best_score_improves_toward_zero() {
        let db = setup();
        let service = practice(&db);
        service
            .record_attempt("u1", d(10), PracticeSize::Daily25, -4, late_evening())
            .unwrap();
        let outcome = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, -2, late_evening())
            .unwrap();
        assert!(!outcome.attempt.created);
        assert_eq!(outcome.attempt.best_score, -2);

        let worse = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, -7, late_evening())
            .unwrap();
        assert_eq!(worse.attempt.best_score, -2);
        let stored = db
            .find_attempt(1, d(10), PracticeSize::Daily25)
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, -2);
    }

    #[test]
    fn second_size_same_day_does_not_double_count() {
        let db = setup();
        let service = practice(&db);
        let first = service
            .record_attempt("u1", d(10), PracticeSize::Daily25, 10, late_evening())
            .unwrap();
        assert_eq!(first.streak_transition, StreakTransition::Reset);
        assert_eq!(first.current_streak, 1);

        let second = service
            .record_attempt("u1", d(10), PracticeSize::Daily50, 10, late_evening())
            .unwrap();
        assert_eq!(second.streak_transition, StreakTransition::Unchanged);
        assert_eq!(second.current_streak, 1);

        let next_day = service
            .record_attempt("u1", d(11), PracticeSize::Daily50, 10, late_evening())
            .unwrap();
        assert_eq!(next_day.streak_transition, StreakTransition::Continued);
        assert_eq!(next_day.current_streak, 2);
        assert_eq!(next_day.max_streak, 2);
    }

    #[test]
    fn submit_validates_before_writing() {
        let db = setup();
        let service = practice(&db);
        let bad = AttemptSubmission::new(30, 10, 20, 10);
        assert!(matches!(
            service.submit("u1", &bad, late_evening()),
            Err(CoreError::Validation(_))
        ));
        assert!(service.history("u1").unwrap().is_empty());
    }

    #[test]
    fn submit_records_against_today_and_status_reflects_it() {
        let db = setup();
        let service = practice(&db);
        let before = service.status("u1", late_evening()).unwrap();
        assert!(!before.is_attempted_today);
        assert_eq!(before.date, d(11));

        let outcome = service
            .submit("u1", &AttemptSubmission::new(50, 33, 50, 33), late_evening())
            .unwrap();
        assert!(outcome.is_attempted_today);

        let after = service.status("u1", late_evening()).unwrap();
        assert!(after.is_attempted_today);
        assert_eq!(
            after.attempted_sizes.into_iter().collect::<Vec<_>>(),
            vec![PracticeSize::Daily50]
        );
        assert_eq!(after.last_practice_date, Some(d(11)));
        assert_eq!(service.history("u1").unwrap()[0].date, d(11));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let db = setup();
        let service = practice(&db);
        assert!(matches!(
            service.record_attempt("ghost", d(10), PracticeSize::Daily25, 1, late_evening()),
            Err(CoreError::NotFound { entity: "user", .. })
        ));
        assert!(matches!(
            service.status("ghost", late_evening()),
            Err(CoreError::NotFound { .. })
        ));
        assert!(db.conn().is_autocommit());
    }

    #[test]
    fn status_serializes_sizes_as_numbers() {
        let db = setup();
        let service = practice(&db);
        service
            .record_attempt("u1", d(11), PracticeSize::Daily25, 5, late_evening())
            .unwrap();
        let json = serde_json::to_value(service.status("u1", late_evening()).unwrap()).unwrap();
        assert_eq!(json["attempted_sizes"], serde_json::json!([25]));
        assert_eq!(json["current_streak"], 1);
    }
}
