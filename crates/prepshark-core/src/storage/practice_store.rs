//! Daily papers and practice attempts.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::database::{format_date, parse_date, parse_timestamp, Database};
use crate::error::DatabaseError;
use crate::practice::{DailyPracticeAttempt, PaperStore, PracticeSize};

fn size_from_column(table: &'static str, value: i64) -> Result<PracticeSize, DatabaseError> {
    PracticeSize::try_from(value).map_err(|e| DatabaseError::CorruptRow {
        table,
        message: e.to_string(),
    })
}

const ATTEMPT_COLUMNS: &str = "id, user_id, date, practice_type, is_completed, score, created_at";

struct AttemptRow {
    id: i64,
    user_id: i64,
    date: String,
    practice_type: i64,
    is_completed: bool,
    score: i32,
    created_at: String,
}

impl AttemptRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            practice_type: row.get(3)?,
            is_completed: row.get(4)?,
            score: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_attempt(self) -> Result<DailyPracticeAttempt, DatabaseError> {
        Ok(DailyPracticeAttempt {
            id: self.id,
            user_id: self.user_id,
            date: parse_date("daily_practice_attempts", &self.date)?,
            practice_type: size_from_column("daily_practice_attempts", self.practice_type)?,
            is_completed: self.is_completed,
            score: self.score,
            created_at: parse_timestamp("daily_practice_attempts", &self.created_at)?,
        })
    }
}

impl PaperStore for Database {
    fn find_paper(
        &self,
        date: NaiveDate,
        size: PracticeSize,
    ) -> Result<Option<Vec<i64>>, DatabaseError> {
        let paper_id: Option<i64> = self
            .conn()
            .query_row(
                "SELECT id FROM daily_papers WHERE date = ?1 AND practice_type = ?2",
                params![format_date(date), size.question_count()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(paper_id) = paper_id else {
            return Ok(None);
        };

        let mut stmt = self.conn().prepare(
            "SELECT question_id FROM daily_paper_questions WHERE paper_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![paper_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(ids))
    }

    fn insert_paper_if_absent(
        &self,
        date: NaiveDate,
        size: PracticeSize,
        question_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.immediate(|db| {
            let inserted = db.conn().execute(
                "INSERT INTO daily_papers (date, practice_type, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(date, practice_type) DO NOTHING",
                params![format_date(date), size.question_count(), now.to_rfc3339()],
            )?;
            if inserted == 0 {
                return Ok(false);
            }

            let paper_id = db.conn().last_insert_rowid();
            let mut stmt = db.conn().prepare(
                "INSERT INTO daily_paper_questions (paper_id, position, question_id)
                 VALUES (?1, ?2, ?3)",
            )?;
            for (position, question_id) in question_ids.iter().enumerate() {
                stmt.execute(params![paper_id, position as i64, question_id])?;
            }
            Ok(true)
        })
    }
}

impl Database {
    pub fn find_attempt(
        &self,
        user_id: i64,
        date: NaiveDate,
        size: PracticeSize,
    ) -> Result<Option<DailyPracticeAttempt>, DatabaseError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM daily_practice_attempts
             WHERE user_id = ?1 AND date = ?2 AND practice_type = ?3"
        );
        let row = self
            .conn()
            .query_row(
                &sql,
                params![user_id, format_date(date), size.question_count()],
                AttemptRow::read,
            )
            .optional()?;
        row.map(AttemptRow::into_attempt).transpose()
    }

    /// Insert a completed attempt. Fails on the unique (user, date, size)
    /// key if one already exists; callers check first inside a transaction.
    pub fn insert_attempt(
        &self,
        user_id: i64,
        date: NaiveDate,
        size: PracticeSize,
        score: i32,
        created_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn().execute(
            "INSERT INTO daily_practice_attempts
                (user_id, date, practice_type, is_completed, score, created_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            params![
                user_id,
                format_date(date),
                size.question_count(),
                score,
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn update_attempt_score(&self, attempt_id: i64, score: i32) -> Result<(), DatabaseError> {
        self.conn().execute(
            "UPDATE daily_practice_attempts SET score = ?1 WHERE id = ?2",
            params![score, attempt_id],
        )?;
        Ok(())
    }

    /// Sizes with a completed attempt by `user_id` on `date`.
    pub fn attempted_sizes(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<BTreeSet<PracticeSize>, DatabaseError> {
        let mut stmt = self.conn().prepare(
            "SELECT DISTINCT practice_type FROM daily_practice_attempts
             WHERE user_id = ?1 AND date = ?2 AND is_completed = 1",
        )?;
        let rows = stmt.query_map(params![user_id, format_date(date)], |row| {
            row.get::<_, i64>(0)
        })?;
        let mut sizes = BTreeSet::new();
        for row in rows {
            sizes.insert(size_from_column("daily_practice_attempts", row?)?);
        }
        Ok(sizes)
    }

    /// All attempts by `user_id`, newest date first.
    pub fn attempts_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DailyPracticeAttempt>, DatabaseError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM daily_practice_attempts
             WHERE user_id = ?1
             ORDER BY date DESC, created_at DESC, id DESC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], AttemptRow::read)?;
        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(row?.into_attempt()?);
        }
        Ok(attempts)
    }

    /// Number of persisted papers for (date, size); at most one.
    pub fn paper_count(&self, date: NaiveDate, size: PracticeSize) -> Result<u64, DatabaseError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM daily_papers WHERE date = ?1 AND practice_type = ?2",
            params![format_date(date), size.question_count()],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{ExamType, NewUser};
    use chrono::TimeZone;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap()
    }

    fn db_with_user() -> (Database, i64) {
        let db = Database::open_memory().unwrap();
        let (user, _) = db
            .register_user(
                &NewUser {
                    external_uid: "u1".into(),
                    email: "u1@example.com".into(),
                    name: "Ravi".into(),
                    exam_type: ExamType::Jee,
                },
                now(),
            )
            .unwrap();
        (db, user.id)
    }

    fn seed_questions(db: &Database, n: usize) -> Vec<i64> {
        (0..n)
            .map(|i| {
                db.upsert_question(&crate::question::NewQuestion {
                    external_id: Some(format!("q{i}")),
                    subject: "Physics".into(),
                    chapter: "Optics".into(),
                    difficulty: Default::default(),
                    text: format!("q{i}"),
                    options: vec!["a".into(), "b".into()],
                    correct_index: 0,
                    explanation: String::new(),
                    tags: vec![],
                    is_premium: false,
                    is_pyq: false,
                    year: None,
                })
                .unwrap()
                .0
            })
            .collect()
    }

    #[test]
    fn paper_insert_is_first_writer_wins() {
        let (db, _) = db_with_user();
        let ids = seed_questions(&db, 4);
        assert!(db
            .insert_paper_if_absent(date(), PracticeSize::Daily25, &ids[..2], now())
            .unwrap());
        assert!(!db
            .insert_paper_if_absent(date(), PracticeSize::Daily25, &ids[2..], now())
            .unwrap());
        assert_eq!(
            db.find_paper(date(), PracticeSize::Daily25).unwrap(),
            Some(ids[..2].to_vec())
        );
        assert_eq!(db.paper_count(date(), PracticeSize::Daily25).unwrap(), 1);
        assert_eq!(db.find_paper(date(), PracticeSize::Daily50).unwrap(), None);
    }

    #[test]
    fn paper_preserves_question_order() {
        let (db, _) = db_with_user();
        let mut ids = seed_questions(&db, 5);
        ids.reverse();
        db.insert_paper_if_absent(date(), PracticeSize::Daily50, &ids, now())
            .unwrap();
        assert_eq!(db.find_paper(date(), PracticeSize::Daily50).unwrap(), Some(ids));
    }

    #[test]
    fn paper_created_at_is_caller_instant() {
        let (db, _) = db_with_user();
        let ids = seed_questions(&db, 2);
        let generated_at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap();
        db.insert_paper_if_absent(date(), PracticeSize::Daily25, &ids, generated_at)
            .unwrap();
        let stored: String = db
            .conn()
            .query_row("SELECT created_at FROM daily_papers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, generated_at.to_rfc3339());
    }

    #[test]
    fn negative_scores_round_trip() {
        let (db, user_id) = db_with_user();
        let id = db
            .insert_attempt(user_id, date(), PracticeSize::Daily50, -4, now())
            .unwrap();
        db.update_attempt_score(id, -2).unwrap();
        let attempt = db
            .find_attempt(user_id, date(), PracticeSize::Daily50)
            .unwrap()
            .unwrap();
        assert_eq!(attempt.score, -2);
    }

    #[test]
    fn attempts_round_trip() {
        let (db, user_id) = db_with_user();
        let id = db
            .insert_attempt(user_id, date(), PracticeSize::Daily25, 60, now())
            .unwrap();
        db.update_attempt_score(id, 80).unwrap();
        let attempt = db
            .find_attempt(user_id, date(), PracticeSize::Daily25)
            .unwrap()
            .unwrap();
        assert_eq!(attempt.score, 80);
        assert!(attempt.is_completed);
        assert!(db.find_attempt(user_id, date(), PracticeSize::Daily50).unwrap().is_none());
    }

    #[test]
    fn duplicate_attempt_violates_unique_key() {
        let (db, user_id) = db_with_user();
        db.insert_attempt(user_id, date(), PracticeSize::Daily25, 10, now())
            .unwrap();
        assert!(db
            .insert_attempt(user_id, date(), PracticeSize::Daily25, 20, now())
            .is_err());
    }

    #[test]
    fn attempted_sizes_and_history() {
        let (db, user_id) = db_with_user();
        let yesterday = date().pred_opt().unwrap();
        db.insert_attempt(user_id, yesterday, PracticeSize::Daily50, 30, now())
            .unwrap();
        db.insert_attempt(user_id, date(), PracticeSize::Daily25, 10, now())
            .unwrap();
        db.insert_attempt(user_id, date(), PracticeSize::Daily50, 20, now())
            .unwrap();

        let sizes = db.attempted_sizes(user_id, date()).unwrap();
        assert_eq!(sizes.len(), 2);

        let history = db.attempts_for_user(user_id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date, date());
        assert_eq!(history[2].date, yesterday);
    }
}
