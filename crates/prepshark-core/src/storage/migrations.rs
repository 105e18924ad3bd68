//! Database schema migrations for prepshark.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: users, plans, subscriptions and the question bank.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            external_uid       TEXT NOT NULL UNIQUE,
            email              TEXT NOT NULL,
            name               TEXT NOT NULL,
            exam_type          TEXT NOT NULL,
            subscription_tier  TEXT NOT NULL DEFAULT 'FREE',
            current_streak     INTEGER NOT NULL DEFAULT 0,
            max_streak         INTEGER NOT NULL DEFAULT 0,
            last_practice_date TEXT,
            created_at         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subscription_plans (
            key           TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            price_paise   INTEGER NOT NULL,
            duration_days INTEGER NOT NULL,
            features      TEXT NOT NULL DEFAULT '[]',
            is_active     INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            plan         TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'ACTIVE',
            started_at   TEXT NOT NULL,
            expires_at   TEXT NOT NULL,
            payment_ref  TEXT NOT NULL,
            amount_paise INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS questions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id   TEXT UNIQUE,
            subject       TEXT NOT NULL,
            chapter       TEXT NOT NULL,
            difficulty    TEXT NOT NULL DEFAULT 'MEDIUM',
            question_text TEXT NOT NULL,
            options       TEXT NOT NULL,
            correct_index INTEGER NOT NULL,
            explanation   TEXT NOT NULL DEFAULT '',
            tags          TEXT NOT NULL DEFAULT '[]',
            is_premium    INTEGER NOT NULL DEFAULT 0,
            is_pyq        INTEGER NOT NULL DEFAULT 0,
            year          INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);
        CREATE INDEX IF NOT EXISTS idx_questions_subject_chapter
            ON questions(subject COLLATE NOCASE, chapter);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: daily papers and practice attempts.
///
/// The UNIQUE constraints carry the at-most-one guarantees for papers per
/// (date, size) and attempts per (user, date, size).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS daily_papers (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            date          TEXT NOT NULL,
            practice_type INTEGER NOT NULL,
            created_at    TEXT NOT NULL,
            UNIQUE (date, practice_type)
        );

        CREATE TABLE IF NOT EXISTS daily_paper_questions (
            paper_id    INTEGER NOT NULL REFERENCES daily_papers(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            question_id INTEGER NOT NULL REFERENCES questions(id),
            PRIMARY KEY (paper_id, position)
        );

        CREATE TABLE IF NOT EXISTS daily_practice_attempts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date          TEXT NOT NULL,
            practice_type INTEGER NOT NULL,
            is_completed  INTEGER NOT NULL DEFAULT 0,
            score         INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL,
            UNIQUE (user_id, date, practice_type)
        );

        CREATE INDEX IF NOT EXISTS idx_attempts_user_date
            ON daily_practice_attempts(user_id, date);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'daily_papers'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn paper_key_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO daily_papers (date, practice_type, created_at)
             VALUES ('2024-01-10', 25, '')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO daily_papers (date, practice_type, created_at)
             VALUES ('2024-01-10', 25, '')",
            [],
        );
        assert!(dup.is_err());
    }
}
