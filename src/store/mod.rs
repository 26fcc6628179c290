//! Durable store: the SQLite database both the vault and the quota
//! tracker live in.
//!
//! A single connection sits behind a mutex.  Every read-modify-write goes
//! through `Database::transaction`, which holds that lock for the whole
//! `BEGIN IMMEDIATE … COMMIT`, so no other operation in this process (and
//! no other process sharing the file) can observe an intermediate state.
//!
//! Timestamps are stored as UTC epoch milliseconds so range deletes are
//! plain integer comparisons.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::errors::{Result, SharePassError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS secrets (
    id            TEXT PRIMARY KEY,
    secret        TEXT NOT NULL,
    attempts      INTEGER NOT NULL DEFAULT 0,
    download_code TEXT NOT NULL UNIQUE,
    upload_time   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS secrets_upload_time ON secrets (upload_time);

CREATE TABLE IF NOT EXISTS quota (
    identity    TEXT PRIMARY KEY,
    uses        INTEGER NOT NULL,
    last_access INTEGER NOT NULL
);
";

/// Handle to the SQLite database.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    ///
    /// Missing parent directories are created and the file is restricted
    /// to its owner on Unix.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000; PRAGMA secure_delete=ON;",
        )?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| SharePassError::Storage(format!("schema setup failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back
    /// otherwise.  The connection lock is held throughout.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SharePassError::Storage("database lock poisoned".into()))?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run a read-only closure against the connection.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SharePassError::Storage("database lock poisoned".into()))?;
        f(&conn)
    }
}

/// Convert a timestamp to the stored representation.
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Convert a stored timestamp back.
pub fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| SharePassError::Storage(format!("timestamp out of range: {millis}")))
}

/// Inclusive bounds of the stored timestamps `from_millis` accepts.
pub fn millis_range() -> (i64, i64) {
    (
        DateTime::<Utc>::MIN_UTC.timestamp_millis(),
        DateTime::<Utc>::MAX_UTC.timestamp_millis(),
    )
}

/// Convert a stored row count.
pub fn to_count(n: i64) -> Result<usize> {
    usize::try_from(n).map_err(|_| SharePassError::Storage(format!("bad row count {n}")))
}
