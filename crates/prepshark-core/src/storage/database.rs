//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Users and their streak counters
//! - The subscription plan catalog and purchase records
//! - The question bank
//! - Daily papers and practice attempts (see `practice_store`)
//!
//! Each `Database` owns one connection. Several connections (threads or
//! processes) may share a file; writers serialize through
//! [`Database::immediate`] and wait on each other via the busy timeout.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError};
use crate::practice::StreakState;
use crate::question::{Difficulty, NewQuestion, Question, QuestionPool};
use crate::subscription::{PlanKey, Subscription, SubscriptionPlan, SubscriptionStatus};
use crate::user::{ExamType, NewUser, SubscriptionTier, User};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a question import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub rejected: usize,
}

/// SQLite database for all engine state.
pub struct Database {
    conn: Connection,
}

// === Helper Functions ===

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(super) fn parse_date(table: &'static str, s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DatabaseError::CorruptRow {
        table,
        message: format!("bad date '{s}': {e}"),
    })
}

pub(super) fn parse_timestamp(
    table: &'static str,
    s: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            table,
            message: format!("bad timestamp '{s}': {e}"),
        })
}

fn parse_json<T>(table: &'static str, s: &str) -> Result<T, DatabaseError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(s).map_err(|e| DatabaseError::CorruptRow {
        table,
        message: format!("bad JSON '{s}': {e}"),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

const USER_COLUMNS: &str = "id, external_uid, email, name, exam_type, subscription_tier,
     current_streak, max_streak, last_practice_date, created_at";

struct UserRow {
    id: i64,
    external_uid: String,
    email: String,
    name: String,
    exam_type: String,
    subscription_tier: String,
    current_streak: u32,
    max_streak: u32,
    last_practice_date: Option<String>,
    created_at: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_uid: row.get(1)?,
            email: row.get(2)?,
            name: row.get(3)?,
            exam_type: row.get(4)?,
            subscription_tier: row.get(5)?,
            current_streak: row.get(6)?,
            max_streak: row.get(7)?,
            last_practice_date: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_user(self) -> Result<User, DatabaseError> {
        let exam_type = ExamType::parse(&self.exam_type).ok_or_else(|| DatabaseError::CorruptRow {
            table: "users",
            message: format!("bad exam type '{}'", self.exam_type),
        })?;
        let last_practice_date = self
            .last_practice_date
            .as_deref()
            .map(|s| parse_date("users", s))
            .transpose()?;
        Ok(User {
            id: self.id,
            external_uid: self.external_uid,
            email: self.email,
            name: self.name,
            exam_type,
            subscription_tier: SubscriptionTier::parse(&self.subscription_tier),
            streak: StreakState {
                current_streak: self.current_streak,
                max_streak: self.max_streak,
                last_practice_date,
            },
            created_at: parse_timestamp("users", &self.created_at)?,
        })
    }
}

const QUESTION_COLUMNS: &str = "id, external_id, subject, chapter, difficulty, question_text,
     options, correct_index, explanation, tags, is_premium, is_pyq, year";

struct QuestionRow {
    id: i64,
    external_id: Option<String>,
    subject: String,
    chapter: String,
    difficulty: String,
    text: String,
    options: String,
    correct_index: u32,
    explanation: String,
    tags: String,
    is_premium: bool,
    is_pyq: bool,
    year: Option<i32>,
}

impl QuestionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            subject: row.get(2)?,
            chapter: row.get(3)?,
            difficulty: row.get(4)?,
            text: row.get(5)?,
            options: row.get(6)?,
            correct_index: row.get(7)?,
            explanation: row.get(8)?,
            tags: row.get(9)?,
            is_premium: row.get(10)?,
            is_pyq: row.get(11)?,
            year: row.get(12)?,
        })
    }

    fn into_question(self) -> Result<Question, DatabaseError> {
        Ok(Question {
            id: self.id,
            external_id: self.external_id,
            subject: self.subject,
            chapter: self.chapter,
            difficulty: Difficulty::parse(&self.difficulty),
            text: self.text,
            options: parse_json("questions", &self.options)?,
            correct_index: self.correct_index,
            explanation: self.explanation,
            tags: parse_json("questions", &self.tags)?,
            is_premium: self.is_premium,
            is_pyq: self.is_pyq,
            year: self.year,
        })
    }
}

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan, status, started_at, expires_at, payment_ref, amount_paise";

struct SubscriptionRow {
    id: i64,
    user_id: i64,
    plan: String,
    status: String,
    started_at: String,
    expires_at: String,
    payment_ref: String,
    amount_paise: i64,
}

impl SubscriptionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            plan: row.get(2)?,
            status: row.get(3)?,
            started_at: row.get(4)?,
            expires_at: row.get(5)?,
            payment_ref: row.get(6)?,
            amount_paise: row.get(7)?,
        })
    }

    fn into_subscription(self) -> Result<Subscription, DatabaseError> {
        let plan = self.plan.parse::<PlanKey>().map_err(|e| DatabaseError::CorruptRow {
            table: "subscriptions",
            message: e.to_string(),
        })?;
        let status =
            SubscriptionStatus::parse(&self.status).ok_or_else(|| DatabaseError::CorruptRow {
                table: "subscriptions",
                message: format!("bad status '{}'", self.status),
            })?;
        Ok(Subscription {
            id: self.id,
            user_id: self.user_id,
            plan,
            status,
            started_at: parse_timestamp("subscriptions", &self.started_at)?,
            expires_at: parse_timestamp("subscriptions", &self.expires_at)?,
            payment_ref: self.payment_ref,
            amount_paise: self.amount_paise,
        })
    }
}

const PLAN_COLUMNS: &str =
    "key, name, description, price_paise, duration_days, features, is_active";

struct PlanRow {
    key: String,
    name: String,
    description: String,
    price_paise: i64,
    duration_days: u32,
    features: String,
    is_active: bool,
}

impl PlanRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price_paise: row.get(3)?,
            duration_days: row.get(4)?,
            features: row.get(5)?,
            is_active: row.get(6)?,
        })
    }

    fn into_plan(self) -> Result<SubscriptionPlan, DatabaseError> {
        Ok(SubscriptionPlan {
            key: self.key.parse::<PlanKey>().map_err(|e| DatabaseError::CorruptRow {
                table: "subscription_plans",
                message: e.to_string(),
            })?,
            name: self.name,
            description: self.description,
            price_paise: self.price_paise,
            duration_days: self.duration_days,
            features: parse_json("subscription_plans", &self.features)?,
            is_active: self.is_active,
        })
    }
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/prepshark.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("prepshark.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so read-modify-write sequences in
    /// `f` cannot interleave with another connection's. Rolls back if `f`
    /// or the commit fails.
    pub fn immediate<T, E>(&self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(DatabaseError::from)?;
        let result = f(self).and_then(|value| {
            self.conn
                .execute_batch("COMMIT;")
                .map_err(|e| E::from(DatabaseError::from(e)))?;
            Ok(value)
        });
        if result.is_err() && !self.conn.is_autocommit() {
            let _ = self.conn.execute_batch("ROLLBACK;");
        }
        result
    }

    // === Users ===

    /// Create a user, or return the existing one with the same external id.
    ///
    /// Returns the user and whether it was created.
    pub fn register_user(
        &self,
        new_user: &NewUser,
        now: DateTime<Utc>,
    ) -> Result<(User, bool), DatabaseError> {
        self.immediate(|db| {
            if let Some(existing) = db.find_user(&new_user.external_uid)? {
                return Ok((existing, false));
            }
            db.conn.execute(
                "INSERT INTO users
                    (external_uid, email, name, exam_type, subscription_tier, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new_user.external_uid,
                    new_user.email,
                    new_user.name,
                    new_user.exam_type.as_str(),
                    SubscriptionTier::Free.as_str(),
                    now.to_rfc3339(),
                ],
            )?;
            let user = db
                .find_user(&new_user.external_uid)?
                .ok_or_else(|| DatabaseError::QueryFailed("inserted user not found".into()))?;
            Ok((user, true))
        })
    }

    pub fn find_user(&self, external_uid: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE external_uid = ?1");
        let row = self
            .conn
            .query_row(&sql, params![external_uid], UserRow::read)
            .optional()?;
        row.map(UserRow::into_user).transpose()
    }

    pub fn save_streak(&self, user_id: i64, streak: &StreakState) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE users SET current_streak = ?1, max_streak = ?2, last_practice_date = ?3
             WHERE id = ?4",
            params![
                streak.current_streak,
                streak.max_streak,
                streak.last_practice_date.map(format_date),
                user_id,
            ],
        )?;
        Ok(())
    }

    pub fn set_subscription_tier(
        &self,
        user_id: i64,
        tier: SubscriptionTier,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE users SET subscription_tier = ?1 WHERE id = ?2",
            params![tier.as_str(), user_id],
        )?;
        Ok(())
    }

    // === Plans ===

    /// Insert or update catalog entries by key.
    pub fn upsert_plans(&self, plans: &[SubscriptionPlan]) -> Result<usize, DatabaseError> {
        self.immediate(|db| {
            for plan in plans {
                db.conn.execute(
                    "INSERT INTO subscription_plans
                        (key, name, description, price_paise, duration_days, features, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(key) DO UPDATE SET
                        name = excluded.name,
                        description = excluded.description,
                        price_paise = excluded.price_paise,
                        duration_days = excluded.duration_days,
                        features = excluded.features,
                        is_active = excluded.is_active",
                    params![
                        plan.key.as_str(),
                        plan.name,
                        plan.description,
                        plan.price_paise,
                        plan.duration_days,
                        to_json(&plan.features)?,
                        plan.is_active,
                    ],
                )?;
            }
            Ok(plans.len())
        })
    }

    /// Catalog entries ordered by price.
    pub fn list_plans(&self, active_only: bool) -> Result<Vec<SubscriptionPlan>, DatabaseError> {
        let sql = format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans
             WHERE is_active = 1 OR ?1 = 0
             ORDER BY price_paise, key"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![active_only], PlanRow::read)?;
        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?.into_plan()?);
        }
        Ok(plans)
    }

    pub fn find_plan(&self, key: PlanKey) -> Result<Option<SubscriptionPlan>, DatabaseError> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE key = ?1");
        let row = self
            .conn
            .query_row(&sql, params![key.as_str()], PlanRow::read)
            .optional()?;
        row.map(PlanRow::into_plan).transpose()
    }

    // === Subscriptions ===

    #[allow(clippy::too_many_arguments)]
    pub fn insert_subscription(
        &self,
        user_id: i64,
        plan: PlanKey,
        status: SubscriptionStatus,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        payment_ref: &str,
        amount_paise: i64,
    ) -> Result<Subscription, DatabaseError> {
        self.conn.execute(
            "INSERT INTO subscriptions
                (user_id, plan, status, started_at, expires_at, payment_ref, amount_paise)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                plan.as_str(),
                status.as_str(),
                started_at.to_rfc3339(),
                expires_at.to_rfc3339(),
                payment_ref,
                amount_paise,
            ],
        )?;
        Ok(Subscription {
            id: self.conn.last_insert_rowid(),
            user_id,
            plan,
            status,
            started_at,
            expires_at,
            payment_ref: payment_ref.to_string(),
            amount_paise,
        })
    }

    /// Every subscription record of a user, newest first.
    pub fn subscriptions_for_user(&self, user_id: i64) -> Result<Vec<Subscription>, DatabaseError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 ORDER BY id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], SubscriptionRow::read)?;
        let mut subscriptions = Vec::new();
        for row in rows {
            subscriptions.push(row?.into_subscription()?);
        }
        Ok(subscriptions)
    }

    // === Questions ===

    /// Insert a question, or update the one sharing its external id.
    ///
    /// Returns the row id and whether a new row was created.
    pub fn upsert_question(&self, question: &NewQuestion) -> Result<(i64, bool), DatabaseError> {
        let existing: Option<i64> = match &question.external_id {
            Some(ext) => self
                .conn
                .query_row(
                    "SELECT id FROM questions WHERE external_id = ?1",
                    params![ext],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        let options = to_json(&question.options)?;
        let tags = to_json(&question.tags)?;

        match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE questions
                     SET subject = ?1, chapter = ?2, difficulty = ?3, question_text = ?4,
                         options = ?5, correct_index = ?6, explanation = ?7, tags = ?8,
                         is_premium = ?9, is_pyq = ?10, year = ?11
                     WHERE id = ?12",
                    params![
                        question.subject,
                        question.chapter,
                        question.difficulty.as_str(),
                        question.text,
                        options,
                        question.correct_index,
                        question.explanation,
                        tags,
                        question.is_premium,
                        question.is_pyq,
                        question.year,
                        id,
                    ],
                )?;
                Ok((id, false))
            }
            None => {
                self.conn.execute(
                    "INSERT INTO questions
                        (external_id, subject, chapter, difficulty, question_text, options,
                         correct_index, explanation, tags, is_premium, is_pyq, year)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        question.external_id,
                        question.subject,
                        question.chapter,
                        question.difficulty.as_str(),
                        question.text,
                        options,
                        question.correct_index,
                        question.explanation,
                        tags,
                        question.is_premium,
                        question.is_pyq,
                        question.year,
                    ],
                )?;
                Ok((self.conn.last_insert_rowid(), true))
            }
        }
    }

    /// Import a batch of questions in one transaction. Invalid questions are
    /// skipped and counted.
    pub fn import_questions(
        &self,
        questions: &[NewQuestion],
    ) -> Result<ImportSummary, DatabaseError> {
        let summary = self.immediate(|db| {
            let mut summary = ImportSummary::default();
            for question in questions {
                if let Err(e) = question.validate() {
                    tracing::warn!(
                        external_id = question.external_id.as_deref().unwrap_or(""),
                        error = %e,
                        "skipping invalid question"
                    );
                    summary.rejected += 1;
                    continue;
                }
                match db.upsert_question(question)? {
                    (_, true) => summary.created += 1,
                    (_, false) => summary.updated += 1,
                }
            }
            Ok::<_, DatabaseError>(summary)
        })?;
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            rejected = summary.rejected,
            "imported questions"
        );
        Ok(summary)
    }

    /// Number of questions, optionally restricted to one subject.
    pub fn question_count(&self, subject: Option<&str>) -> Result<u64, DatabaseError> {
        let count = match subject {
            Some(subject) => self.conn.query_row(
                "SELECT COUNT(*) FROM questions WHERE subject = ?1 COLLATE NOCASE",
                params![subject],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?,
        };
        Ok(count)
    }
}

impl QuestionPool for Database {
    fn question_ids_by_subject(&self, subject: &str) -> Result<Vec<i64>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM questions WHERE subject = ?1 COLLATE NOCASE ORDER BY id")?;
        let rows = stmt.query_map(params![subject], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id IN ({placeholders})");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), QuestionRow::read)?;

        let mut by_id = HashMap::with_capacity(ids.len());
        for row in rows {
            let question = row?.into_question()?;
            by_id.insert(question.id, question);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::default_catalog;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap()
    }

    fn new_user(uid: &str) -> NewUser {
        NewUser {
            external_uid: uid.into(),
            email: format!("{uid}@example.com"),
            name: "Asha".into(),
            exam_type: ExamType::Neet,
        }
    }

    fn question(ext: &str, subject: &str) -> NewQuestion {
        NewQuestion {
            external_id: Some(ext.into()),
            subject: subject.into(),
            chapter: "Kinematics".into(),
            difficulty: Difficulty::Easy,
            text: format!("question {ext}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 1,
            explanation: String::new(),
            tags: vec!["pyq".into()],
            is_premium: false,
            is_pyq: true,
            year: Some(2021),
        }
    }

    #[test]
    fn register_is_get_or_create() {
        let db = Database::open_memory().unwrap();
        let (user, created) = db.register_user(&new_user("u1"), now()).unwrap();
        assert!(created);
        assert_eq!(user.subscription_tier, SubscriptionTier::Free);
        assert_eq!(user.streak, StreakState::default());

        let (again, created) = db.register_user(&new_user("u1"), now()).unwrap();
        assert!(!created);
        assert_eq!(again.id, user.id);
    }

    #[test]
    fn streak_round_trips() {
        let db = Database::open_memory().unwrap();
        let (user, _) = db.register_user(&new_user("u1"), now()).unwrap();
        let streak = StreakState {
            current_streak: 4,
            max_streak: 9,
            last_practice_date: NaiveDate::from_ymd_opt(2024, 1, 9),
        };
        db.save_streak(user.id, &streak).unwrap();
        assert_eq!(db.find_user("u1").unwrap().unwrap().streak, streak);
    }

    #[test]
    fn plans_upsert_and_list_by_price() {
        let db = Database::open_memory().unwrap();
        db.upsert_plans(&default_catalog()).unwrap();
        db.upsert_plans(&default_catalog()).unwrap();
        let plans = db.list_plans(true).unwrap();
        assert_eq!(plans.len(), 5);
        assert_eq!(plans[0].key, PlanKey::ChapterUnlock);
        assert_eq!(plans[4].key, PlanKey::YearlyElite);

        let mut retired = default_catalog().remove(0);
        retired.is_active = false;
        db.upsert_plans(&[retired]).unwrap();
        assert_eq!(db.list_plans(true).unwrap().len(), 4);
        assert_eq!(db.list_plans(false).unwrap().len(), 5);
        assert!(!db.find_plan(PlanKey::ChapterUnlock).unwrap().unwrap().is_active);
    }

    #[test]
    fn subscriptions_round_trip() {
        let db = Database::open_memory().unwrap();
        let (user, _) = db.register_user(&new_user("u1"), now()).unwrap();
        let inserted = db
            .insert_subscription(
                user.id,
                PlanKey::DailyPractice,
                SubscriptionStatus::Active,
                now(),
                now() + Duration::days(365),
                "pay_1",
                24_900,
            )
            .unwrap();
        assert_eq!(db.subscriptions_for_user(user.id).unwrap(), vec![inserted]);
    }

    #[test]
    fn question_upsert_by_external_id() {
        let db = Database::open_memory().unwrap();
        let (id, created) = db.upsert_question(&question("q1", "Physics")).unwrap();
        assert!(created);

        let mut edited = question("q1", "Physics");
        edited.text = "edited".into();
        let (same_id, created) = db.upsert_question(&edited).unwrap();
        assert!(!created);
        assert_eq!(same_id, id);

        let stored = db.questions_by_ids(&[id]).unwrap();
        assert_eq!(stored[0].text, "edited");
        assert_eq!(stored[0].tags, vec!["pyq".to_string()]);
    }

    #[test]
    fn import_counts_rejected_questions() {
        let db = Database::open_memory().unwrap();
        let mut bad = question("q2", "Physics");
        bad.correct_index = 9;
        let summary = db
            .import_questions(&[question("q1", "Physics"), bad, question("q1", "Physics")])
            .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                updated: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn subject_lookup_ignores_case() {
        let db = Database::open_memory().unwrap();
        db.upsert_question(&question("q1", "PHYSICS")).unwrap();
        db.upsert_question(&question("q2", "physics")).unwrap();
        db.upsert_question(&question("q3", "Botany")).unwrap();
        assert_eq!(db.question_ids_by_subject("Physics").unwrap().len(), 2);
        assert_eq!(db.question_count(Some("physics")).unwrap(), 2);
        assert_eq!(db.question_count(None).unwrap(), 3);
    }

    #[test]
    fn questions_by_ids_keeps_requested_order_and_skips_unknown() {
        let db = Database::open_memory().unwrap();
        let (a, _) = db.upsert_question(&question("q1", "Physics")).unwrap();
        let (b, _) = db.upsert_question(&question("q2", "Physics")).unwrap();
        let found = db.questions_by_ids(&[b, 999, a]).unwrap();
        let ids: Vec<i64> = found.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_memory().unwrap();
        let result: Result<(), DatabaseError> = db.immediate(|db| {
            db.upsert_question(&question("q1", "Physics"))?;
            Err(DatabaseError::QueryFailed("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.question_count(None).unwrap(), 0);
        assert!(db.conn().is_autocommit());
    }
}
