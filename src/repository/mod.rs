//! SQLite persistence layer.
//!
//! [`Database`] is a thin façade over an `sqlx` pool. Entity-specific
//! operations live in the submodules (`users`, `cases`, `evidence`,
//! `timeline`, `analytics`), all as methods on `Database`. Multi-step
//! writes (evidence/timeline creates and deletes, the case deletion
//! cascade) run inside a single transaction together with the case
//! counter recompute.

mod analytics;
mod cases;
mod evidence;
mod timeline;
mod users;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::errors::ApiError;
use crate::validation::CanonicalEnum;

/// Tables and indexes, one statement each. Executed in order at startup;
/// every statement is idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'ANALYST',
        avatar TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cases (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'OPEN',
        severity TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        location_city TEXT,
        location_country TEXT,
        location_lat REAL,
        location_lng REAL,
        evidence_count INTEGER NOT NULL DEFAULT 0,
        events_count INTEGER NOT NULL DEFAULT 0,
        suspicious_activities INTEGER NOT NULL DEFAULT 0,
        created_by_id TEXT NOT NULL REFERENCES users(id),
        assigned_to_id TEXT REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS evidence (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        evidence_type TEXT NOT NULL,
        description TEXT,
        file_path TEXT,
        file_size INTEGER,
        md5_hash TEXT NOT NULL,
        sha256_hash TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        case_id TEXT NOT NULL REFERENCES cases(id),
        uploaded_by_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chain_of_custody (
        id TEXT PRIMARY KEY,
        action TEXT NOT NULL,
        notes TEXT,
        timestamp TEXT NOT NULL,
        evidence_id TEXT NOT NULL REFERENCES evidence(id),
        performed_by_id TEXT NOT NULL REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS timeline_events (
        id TEXT PRIMARY KEY,
        timestamp TEXT NOT NULL,
        event_type TEXT NOT NULL,
        source TEXT NOT NULL,
        severity TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        ip_addresses TEXT NOT NULL DEFAULT '[]',
        usernames TEXT NOT NULL DEFAULT '[]',
        files TEXT NOT NULL DEFAULT '[]',
        devices TEXT NOT NULL DEFAULT '[]',
        case_id TEXT NOT NULL REFERENCES cases(id),
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status)",
    "CREATE INDEX IF NOT EXISTS idx_cases_severity ON cases(severity)",
    "CREATE INDEX IF NOT EXISTS idx_cases_created_by ON cases(created_by_id)",
    "CREATE INDEX IF NOT EXISTS idx_evidence_case ON evidence(case_id)",
    "CREATE INDEX IF NOT EXISTS idx_custody_evidence ON chain_of_custody(evidence_id)",
    "CREATE INDEX IF NOT EXISTS idx_timeline_case ON timeline_events(case_id)",
    "CREATE INDEX IF NOT EXISTS idx_timeline_severity ON timeline_events(severity)",
    "CREATE INDEX IF NOT EXISTS idx_timeline_timestamp ON timeline_events(timestamp)",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `url` with foreign keys
    /// enforced.
    pub async fn connect(url: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ApiError::internal(format!("invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. Pinned to a single connection: each
    /// SQLite `:memory:` connection is its own database, so a larger pool
    /// would scatter tables across connections.
    pub async fn connect_in_memory() -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| ApiError::internal(format!("invalid in-memory options: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn create_tables(&self) -> Result<(), ApiError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("database schema ensured");
        Ok(())
    }

    /// Deletes every row, children before parents. The seeding binary uses
    /// this to rebuild the demo dataset from a clean slate.
    pub async fn clear_all(&self) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;
        for table in ["timeline_events", "chain_of_custody", "evidence", "cases", "users"] {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Decodes a canonical enum column; a value outside the canonical set means
/// the row was written by something other than this service.
pub(crate) fn decode_enum<E: CanonicalEnum>(
    column: &'static str,
    raw: &str,
) -> Result<E, ApiError> {
    E::from_canonical(raw)
        .ok_or_else(|| ApiError::internal(format!("corrupt {column} value in database: {raw}")))
}

pub(crate) fn decode_string_list(column: &'static str, raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("corrupt {column} JSON in database: {e}");
            Vec::new()
        }
    }
}

pub(crate) fn decode_json_object(column: &'static str, raw: &str) -> serde_json::Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("corrupt {column} JSON in database: {e}");
            serde_json::json!({})
        }
    }
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value)
        .map_err(|e| ApiError::internal(format!("failed to encode JSON column: {e}")))
}
