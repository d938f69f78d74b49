//! Time units used by the cookie table
//!
//! `expiry` is stored in epoch seconds while `lastAccessed` is stored in epoch
//! microseconds, so every threshold needs converting into the right unit.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in one day
pub const SECONDS_IN_DAY: i64 = 86_400;

/// Microseconds in one second
pub const MICROS_IN_SECOND: i64 = 1_000_000;

/// Largest day threshold accepted anywhere (roughly one hundred years)
pub const MAX_DAYS: u32 = 36_500;

/// Convert a day count into seconds (the unit of `expiry`)
pub fn days_to_secs(days: u32) -> i64 {
    i64::from(days).saturating_mul(SECONDS_IN_DAY)
}

/// Convert a day count into microseconds (the unit of `lastAccessed`)
pub fn days_to_micros(days: u32) -> i64 {
    days_to_secs(days).saturating_mul(MICROS_IN_SECOND)
}

/// Current wall-clock time in seconds since the Unix epoch
///
/// Store queries read "now" from the database clock instead; this is only
/// used for bookkeeping such as the last idle run.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
