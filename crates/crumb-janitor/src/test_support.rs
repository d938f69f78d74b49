//! Throwaway cookie databases for unit tests

use crumb_store::{CookieDb, COOKIE_DB_FILE};
use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub(crate) const DAY: i64 = 86_400;

const CREATE_COOKIES: &str = "CREATE TABLE moz_cookies (
    id INTEGER PRIMARY KEY,
    host TEXT NOT NULL DEFAULT 'example.com',
    expiry INTEGER NOT NULL,
    lastAccessed INTEGER NOT NULL
);";

/// A profile directory holding a `cookies.sqlite` shaped like the browser's
pub(crate) struct CookieFixture {
    dir: TempDir,
}

impl CookieFixture {
    pub(crate) fn new() -> Self {
        let fixture = Self::empty();
        fixture.connect().execute_batch(CREATE_COOKIES).unwrap();
        fixture
    }

    /// A valid database that lacks the cookie table
    pub(crate) fn without_table() -> Self {
        let fixture = Self::empty();
        fixture
            .connect()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        fixture
    }

    fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn connect(&self) -> Connection {
        Connection::open(self.dir.path().join(COOKIE_DB_FILE)).unwrap()
    }

    pub(crate) fn db(&self) -> CookieDb {
        CookieDb::in_profile(self.dir.path())
    }

    pub(crate) fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    pub(crate) fn now_micros(&self) -> i64 {
        self.now_secs() * 1_000_000
    }

    pub(crate) fn insert(&self, expiry: i64, last_accessed: i64) {
        self.connect()
            .execute(
                "INSERT INTO moz_cookies (expiry, lastAccessed) VALUES (?1, ?2)",
                params![expiry, last_accessed],
            )
            .unwrap();
    }

    /// Cookie used just now, expiring `offset` seconds from now
    pub(crate) fn insert_expiring_in_secs(&self, offset: i64) {
        self.insert(self.now_secs() + offset, self.now_micros());
    }

    pub(crate) fn insert_expiring_in_days(&self, days: i64) {
        self.insert_expiring_in_secs(days * DAY);
    }

    /// Cookie far from expiry, last used `days` days ago
    pub(crate) fn insert_accessed_days_ago(&self, days: u32) {
        let ago = i64::from(days) * DAY * 1_000_000;
        self.insert(self.now_secs() + 10 * 365 * DAY, self.now_micros() - ago);
    }

    pub(crate) fn row_count(&self) -> i64 {
        self.connect()
            .query_row("SELECT COUNT(*) FROM moz_cookies", [], |row| row.get(0))
            .unwrap()
    }

    /// Expiry of every row, in insertion order
    pub(crate) fn expiries(&self) -> Vec<i64> {
        let conn = self.connect();
        let mut stmt = conn
            .prepare("SELECT expiry FROM moz_cookies ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<i64>, _>>()
            .unwrap();
        rows
    }
}
