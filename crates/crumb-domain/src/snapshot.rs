//! Metrics snapshot - a read-only preview of what maintenance would affect

use std::collections::BTreeMap;

/// Counts computed before a maintenance run
///
/// Each bucket entry is an independent point query: `unused[d]` is the number
/// of cookies not accessed for more than `d` days, and `long_lived[d]` is the
/// number of cookies expiring more than `d` days from now. A cookie unused for
/// 100 days therefore appears in every unused bucket up to 100.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Cookies whose expiry is already in the past
    pub expired: u64,

    /// Unused-cookie counts keyed by day threshold
    pub unused: BTreeMap<u32, u64>,

    /// Long-lived cookie counts keyed by day horizon
    pub long_lived: BTreeMap<u32, u64>,
}

impl MetricsSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of cookies unused for more than `days`, if that bucket was computed
    pub fn unused_at(&self, days: u32) -> Option<u64> {
        self.unused.get(&days).copied()
    }

    /// Count of cookies expiring more than `days` from now, if computed
    pub fn long_lived_at(&self, days: u32) -> Option<u64> {
        self.long_lived.get(&days).copied()
    }

    /// Whether every count in the snapshot is zero
    pub fn is_empty(&self) -> bool {
        self.expired == 0
            && self.unused.values().all(|c| *c == 0)
            && self.long_lived.values().all(|c| *c == 0)
    }
}
