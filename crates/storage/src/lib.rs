use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Submission, SubmissionId, EVENT_DATE_FORMAT, SUBMITTED_AT_FORMAT};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubmission {
    pub id: SubmissionId,
    pub user_name: String,
    pub user_age: i64,
    pub event_date: NaiveDate,
    pub submitted_at: NaiveDateTime,
}

impl StoredSubmission {
    pub fn to_submission(&self) -> Submission {
        Submission {
            id: Some(self.id),
            user_name: self.user_name.clone(),
            user_age: self.user_age,
            event_date: self.event_date.format(EVENT_DATE_FORMAT).to_string(),
            submitted_at: self.submitted_at.format(SUBMITTED_AT_FORMAT).to_string(),
        }
    }
}

impl From<StoredSubmission> for Submission {
    fn from(value: StoredSubmission) -> Self {
        value.to_submission()
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `:memory:` opens its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores a submission stamped with the current UTC time.
    pub async fn insert_submission(
        &self,
        user_name: &str,
        user_age: i64,
        event_date: NaiveDate,
    ) -> Result<StoredSubmission> {
        let submitted_at = Utc::now().naive_utc();
        let rec = sqlx::query(
            "INSERT INTO submissions (user_name, user_age, event_date, submitted_at)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(user_name)
        .bind(user_age)
        .bind(event_date)
        .bind(submitted_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert submission")?;

        Ok(StoredSubmission {
            id: SubmissionId(rec.get::<i64, _>(0)),
            user_name: user_name.to_string(),
            user_age,
            event_date,
            submitted_at,
        })
    }

    /// Newest first; ties on the timestamp fall back to insertion order.
    pub async fn list_submissions(&self) -> Result<Vec<StoredSubmission>> {
        let rows = sqlx::query(
            "SELECT id, user_name, user_age, event_date, submitted_at
             FROM submissions
             ORDER BY submitted_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list submissions")?;
        Ok(rows.iter().map(stored_submission_from_row).collect())
    }

    pub async fn load_submission(&self, id: SubmissionId) -> Result<Option<StoredSubmission>> {
        let row = sqlx::query(
            "SELECT id, user_name, user_age, event_date, submitted_at
             FROM submissions
             WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load submission {}", id.0))?;
        Ok(row.as_ref().map(stored_submission_from_row))
    }

    pub async fn count_submissions(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
            .fetch_one(&self.pool)
            .await
            .context("failed to count submissions")?;
        Ok(count)
    }
}

fn stored_submission_from_row(r: &SqliteRow) -> StoredSubmission {
    StoredSubmission {
        id: SubmissionId(r.get::<i64, _>(0)),
        user_name: r.get::<String, _>(1),
        user_age: r.get::<i64, _>(2),
        event_date: r.get::<NaiveDate, _>(3),
        submitted_at: r.get::<NaiveDateTime, _>(4),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
