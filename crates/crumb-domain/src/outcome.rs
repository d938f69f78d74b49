//! Run outcome reported back to the host

use std::fmt;

/// Per-feature counts for one maintenance run
///
/// Each field is the pre-run snapshot value at the configured threshold, or
/// zero when the feature is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunResult {
    /// Expired cookies deleted
    pub deleted_expired: u64,

    /// Unused cookies deleted
    pub deleted_unused: u64,

    /// Cookies whose expiry was capped
    pub expiry_capped: u64,
}

impl RunResult {
    /// Total cookies deleted by this run
    pub fn deleted(&self) -> u64 {
        self.deleted_expired.saturating_add(self.deleted_unused)
    }

    /// Total cookies modified (expiry shortened) by this run
    pub fn modified(&self) -> u64 {
        self.expiry_capped
    }

    /// Whether the run reported no changes at all
    pub fn is_empty(&self) -> bool {
        self.deleted() == 0 && self.modified() == 0
    }
}

fn cookies(count: u64) -> String {
    if count == 1 {
        "1 cookie".to_string()
    } else {
        format!("{} cookies", count)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deleted, {} modified",
            cookies(self.deleted()),
            cookies(self.modified())
        )
    }
}
