//! Metrics engine: read-only counts previewing what maintenance would do
//!
//! Every query reads "now" from the database clock, so bucket counts taken in
//! the same run may drift by a second. That is fine for a preview.

use crate::JanitorError;
use crumb_domain::time::{days_to_micros, days_to_secs};
use crumb_domain::{BucketSet, MetricsSnapshot};
use crumb_store::{named_params, Session};

pub(crate) const COUNT_EXPIRED_SQL: &str =
    "SELECT COUNT(*) FROM moz_cookies WHERE expiry < CAST(strftime('%s', 'now') AS INTEGER)";

pub(crate) const COUNT_UNUSED_SQL: &str = "SELECT COUNT(*) FROM moz_cookies \
     WHERE lastAccessed < CAST(strftime('%s', 'now') AS INTEGER) * 1000000 - :us";

pub(crate) const COUNT_LONG_LIVED_SQL: &str = "SELECT COUNT(*) FROM moz_cookies \
     WHERE expiry > CAST(strftime('%s', 'now') AS INTEGER) + :s";

/// Count cookies whose expiry is already in the past
pub fn count_expired(session: &Session) -> Result<u64, JanitorError> {
    Ok(session.query_count(COUNT_EXPIRED_SQL, &[])?)
}

/// Count cookies not accessed for more than `days` days
pub fn count_unused(session: &Session, days: u32) -> Result<u64, JanitorError> {
    let us = days_to_micros(days);
    Ok(session.query_count(COUNT_UNUSED_SQL, named_params! { ":us": us })?)
}

/// Count cookies that expire more than `days` days from now
pub fn count_long_lived(session: &Session, days: u32) -> Result<u64, JanitorError> {
    let s = days_to_secs(days);
    Ok(session.query_count(COUNT_LONG_LIVED_SQL, named_params! { ":s": s })?)
}

/// Compute a full snapshot over the given buckets
///
/// Any failing query aborts the whole snapshot; partial results are never
/// returned.
pub fn compute_snapshot(session: &Session, buckets: &BucketSet) -> Result<MetricsSnapshot, JanitorError> {
    let mut snapshot = MetricsSnapshot::new();

    snapshot.expired = count_expired(session)?;

    for days in buckets.unused.iter() {
        let count = count_unused(session, days)?;
        tracing::debug!("Unused bucket {}d: {} cookies", days, count);
        snapshot.unused.insert(days, count);
    }

    for days in buckets.long_lived.iter() {
        let count = count_long_lived(session, days)?;
        tracing::debug!("Long-lived bucket {}d: {} cookies", days, count);
        snapshot.long_lived.insert(days, count);
    }

    tracing::debug!(
        "Snapshot: {} expired, {} unused buckets, {} long-lived buckets",
        snapshot.expired,
        snapshot.unused.len(),
        snapshot.long_lived.len()
    );
    Ok(snapshot)
}
