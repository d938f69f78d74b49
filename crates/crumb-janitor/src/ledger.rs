//! Lifetime counters of cookies handled by the janitor
//!
//! Counters only ever grow, and only after a fully successful run.

use crate::config::{
    flush, read_counter, write, PREF_DELETE_EXPIRED_COUNT, PREF_DELETE_UNUSED_COUNT, PREF_EXPIRE_COUNT,
};
use crate::JanitorError;
use crumb_domain::{PrefValue, Preferences, RunResult};
use serde::{Deserialize, Serialize};

/// Persisted per-feature totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Expired cookies deleted over the tool's lifetime
    pub delete_expired: u64,

    /// Unused cookies deleted over the tool's lifetime
    pub delete_unused: u64,

    /// Cookies whose expiry was capped over the tool's lifetime
    pub expire: u64,
}

impl Ledger {
    /// Read the counters; invalid values count as zero
    pub fn load<P: Preferences>(prefs: &P) -> Self {
        Self {
            delete_expired: read_counter(prefs, PREF_DELETE_EXPIRED_COUNT),
            delete_unused: read_counter(prefs, PREF_DELETE_UNUSED_COUNT),
            expire: read_counter(prefs, PREF_EXPIRE_COUNT),
        }
    }

    /// Write the counters and flush
    pub fn save<P: Preferences>(&self, prefs: &mut P) -> Result<(), JanitorError> {
        self.stage(prefs)?;
        flush(prefs)
    }

    /// Write the counters without flushing
    pub(crate) fn stage<P: Preferences>(&self, prefs: &mut P) -> Result<(), JanitorError> {
        write(prefs, PREF_DELETE_EXPIRED_COUNT, counter(self.delete_expired))?;
        write(prefs, PREF_DELETE_UNUSED_COUNT, counter(self.delete_unused))?;
        write(prefs, PREF_EXPIRE_COUNT, counter(self.expire))
    }

    /// Add one run's counts
    pub fn record(&mut self, result: &RunResult) {
        self.delete_expired = self.delete_expired.saturating_add(result.deleted_expired);
        self.delete_unused = self.delete_unused.saturating_add(result.deleted_unused);
        self.expire = self.expire.saturating_add(result.expiry_capped);
    }

    /// Total cookies deleted over the tool's lifetime
    pub fn total_deleted(&self) -> u64 {
        self.delete_expired.saturating_add(self.delete_unused)
    }
}

fn counter(value: u64) -> PrefValue {
    PrefValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
}
