//! Shared fixtures for crumb-janitor integration tests

#![allow(dead_code)]

use crumb_janitor::{JanitorError, RunObserver, RunSummary, Trigger};
use crumb_store::{CookieDb, COOKIE_DB_FILE};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const DAY: i64 = 86_400;

/// A browser profile directory holding a `cookies.sqlite`
pub struct Profile {
    pub dir: TempDir,
}

impl Profile {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Connection::open(dir.path().join(COOKIE_DB_FILE))
            .unwrap()
            .execute_batch(
                "CREATE TABLE moz_cookies (
                    id INTEGER PRIMARY KEY,
                    host TEXT NOT NULL DEFAULT 'example.com',
                    name TEXT NOT NULL DEFAULT 'sid',
                    expiry INTEGER NOT NULL,
                    lastAccessed INTEGER NOT NULL
                );",
            )
            .unwrap();
        Self { dir }
    }

    /// A profile directory with no cookie database at all
    pub fn missing() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn db(&self) -> CookieDb {
        CookieDb::in_profile(self.dir.path()).with_busy_timeout(Duration::from_millis(50))
    }

    pub fn connect(&self) -> Connection {
        Connection::open(self.dir.path().join(COOKIE_DB_FILE)).unwrap()
    }

    pub fn insert(&self, expiry: i64, last_accessed: i64) {
        self.connect()
            .execute(
                "INSERT INTO moz_cookies (expiry, lastAccessed) VALUES (?1, ?2)",
                params![expiry, last_accessed],
            )
            .unwrap();
    }

    /// Cookie last used `days` days ago, expiring in `expires_in_days` days
    pub fn insert_cookie(&self, expires_in_days: i64, accessed_days_ago: i64) {
        let now = now_secs();
        self.insert(
            now + expires_in_days * DAY,
            (now - accessed_days_ago * DAY) * 1_000_000,
        );
    }

    pub fn row_count(&self) -> i64 {
        self.connect()
            .query_row("SELECT COUNT(*) FROM moz_cookies", [], |row| row.get(0))
            .unwrap()
    }

    pub fn max_expiry(&self) -> Option<i64> {
        self.connect()
            .query_row("SELECT MAX(expiry) FROM moz_cookies", [], |row| row.get(0))
            .unwrap()
    }
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Observer that records every notification
#[derive(Default)]
pub struct RecordingObserver {
    pub completed: Mutex<Vec<RunSummary>>,
    pub failed: Mutex<Vec<(Trigger, String)>>,
}

impl RunObserver for RecordingObserver {
    fn on_run_complete(&self, summary: &RunSummary) {
        self.completed.lock().unwrap().push(summary.clone());
    }

    fn on_run_failed(&self, trigger: Trigger, error: &JanitorError) {
        self.failed.lock().unwrap().push((trigger, error.to_string()));
    }
}
