//! Crumb Storage Layer
//!
//! Scoped access to the browser's cookie database plus the key-value
//! preference backends the janitor keeps its settings and ledger in.
//!
//! # Architecture
//!
//! - The cookie database is owned by the browser; this crate never creates or
//!   migrates it. Opening a missing file fails instead of creating one.
//! - Every unit of work opens a short-lived [`Session`] and closes it again.
//!   [`CookieDb::with_session`] guarantees the close on every exit path.
//! - Statements are prepared through the connection's statement cache and all
//!   values are bound as named parameters.
//!
//! # Examples
//!
//! ```no_run
//! use crumb_store::{CookieDb, StoreError};
//!
//! # fn main() -> Result<(), StoreError> {
//! let db = CookieDb::in_profile("/home/me/.mozilla/firefox/abc.default");
//! let total = db.with_session(|session| {
//!     session.query_count("SELECT COUNT(*) FROM moz_cookies", &[])
//! })?;
//! println!("{} cookies", total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod prefs;

pub use prefs::{MemoryPrefs, PrefsError, TomlPrefs};
pub use rusqlite::{named_params, ToSql};

use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the cookie database inside a browser profile
pub const COOKIE_DB_FILE: &str = "cookies.sqlite";

/// Table holding cookie rows
pub const COOKIE_TABLE: &str = "moz_cookies";

/// How long a statement waits on a lock held by the browser before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database cannot be opened or is locked by another process
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Malformed SQL, parameter mismatch or constraint violation
    #[error("Query error: {0}")]
    Query(#[source] rusqlite::Error),
}

impl StoreError {
    /// Whether this error means the store could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied
                | ErrorCode::FileLockingProtocolFailed,
            ) => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Query(e),
        }
    }
}

/// Location and connection settings for a cookie database
///
/// Cheap to clone; holds no connection of its own.
#[derive(Debug, Clone)]
pub struct CookieDb {
    path: PathBuf,
    busy_timeout: Duration,
}

impl CookieDb {
    /// Point at a cookie database file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Point at `cookies.sqlite` inside a browser profile directory
    pub fn in_profile<P: AsRef<Path>>(profile_dir: P) -> Self {
        Self::new(profile_dir.as_ref().join(COOKIE_DB_FILE))
    }

    /// Override the lock wait applied to each session
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new session
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file is missing, unreadable,
    /// or not a database.
    pub fn open(&self) -> Result<Session, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            StoreError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(self.busy_timeout)?;

        tracing::debug!("Opened cookie database {}", self.path.display());
        Ok(Session {
            conn: Some(conn),
            path: self.path.clone(),
        })
    }

    /// Run `f` inside a scoped session that is closed on every exit path
    ///
    /// When `f` fails its error wins; a close failure after a successful `f`
    /// is reported instead.
    pub fn with_session<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<StoreError>,
    {
        let session = self.open()?;
        match f(&session) {
            Ok(value) => {
                session.close()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(close_err) = session.close() {
                    tracing::warn!("Failed to close cookie database after error: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

/// An open connection to the cookie database
///
/// Dropping a session closes it; [`Session::close`] does the same but reports
/// failures.
pub struct Session {
    conn: Option<Connection>,
    path: PathBuf,
}

impl Session {
    fn connection(&self) -> Result<&Connection, StoreError> {
        self.conn
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("session already closed".to_string()))
    }

    /// Run a single-value aggregate query such as `SELECT COUNT(*) ...`
    pub fn query_count(&self, sql: &str, params: &[(&str, &dyn ToSql)]) -> Result<u64, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let count: i64 = stmt.query_row(params, |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run a mutating statement, returning the number of rows changed
    pub fn execute(&self, sql: &str, params: &[(&str, &dyn ToSql)]) -> Result<usize, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(sql)?;
        Ok(stmt.execute(params)?)
    }

    /// Path of the database this session is connected to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the session, reporting any failure
    pub fn close(mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| StoreError::from(e)),
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Failed to close cookie database {}: {}", self.path.display(), e);
            }
        }
    }
}
