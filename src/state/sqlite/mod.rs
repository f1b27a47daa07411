use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

mod interactions;
mod migrations;
mod notes;
mod query;
mod quota;

/// Timestamp layout shared with SQLite's `datetime('now')`, so generated
/// queries can compare stored values against `datetime(...)` expressions.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Set restrictive file permissions (0600) on the database and WAL files.
#[cfg(unix)]
fn set_db_file_permissions(db_path: &str) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::Permissions::from_mode(0o600);
    if let Err(e) = std::fs::set_permissions(db_path, mode.clone()) {
        tracing::warn!("Failed to set permissions on {}: {}", db_path, e);
    }
    // WAL and shared-memory files created by SQLite in WAL journal mode
    for suffix in &["-wal", "-shm"] {
        let path = format!("{}{}", db_path, suffix);
        if std::path::Path::new(&path).exists() {
            if let Err(e) = std::fs::set_permissions(&path, mode.clone()) {
                tracing::warn!("Failed to set permissions on {}: {}", path, e);
            }
        }
    }
}

#[cfg(not(unix))]
fn set_db_file_permissions(_db_path: &str) {}

/// The single process-wide storage handle. Opened once in `core::run`,
/// shared by `Arc`, closed on shutdown.
pub struct SqliteStateStore {
    pool: SqlitePool,
    /// Connections opened with `SQLITE_OPEN_READONLY`. Model-generated SQL
    /// runs only here; no statement it contains can turn writing back on.
    read_pool: SqlitePool,
}

impl SqliteStateStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        set_db_file_permissions(db_path);

        migrations::migrate_state(&pool).await?;

        // Opened after migrations so the file and schema already exist.
        let read_opts = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);
        let read_pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(read_opts)
            .await?;

        Ok(Self { pool, read_pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn close(&self) {
        self.read_pool.close().await;
        self.pool.close().await;
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts SQLite's default layout and RFC 3339.
#[cfg(test)]
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Parse a stored window date; tolerates a trailing time part.
#[cfg(test)]
fn parse_window_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}
