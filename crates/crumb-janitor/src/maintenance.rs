//! Maintenance engine: the three mutating statements
//!
//! Statements run in a fixed order (delete expired, delete unused, cap expiry)
//! and each commits on its own. Every statement is safe to re-apply: deletes
//! are naturally idempotent and the expiry cap is a `MIN` clamp.

use crate::JanitorError;
use crumb_domain::time::{days_to_micros, days_to_secs};
use crumb_store::{named_params, Session};

pub(crate) const DELETE_EXPIRED_SQL: &str =
    "DELETE FROM moz_cookies WHERE expiry < CAST(strftime('%s', 'now') AS INTEGER)";

pub(crate) const DELETE_UNUSED_SQL: &str = "DELETE FROM moz_cookies \
     WHERE lastAccessed < CAST(strftime('%s', 'now') AS INTEGER) * 1000000 - :us";

// Rows already within the cap are left untouched so the change count only
// reports cookies that were actually shortened.
pub(crate) const CAP_EXPIRY_SQL: &str = "UPDATE moz_cookies \
     SET expiry = MIN(CAST(strftime('%s', 'now') AS INTEGER) + :s, expiry) \
     WHERE expiry > CAST(strftime('%s', 'now') AS INTEGER) + :s";

/// Which maintenance statements to run
///
/// Zero or false means the feature is disabled, never "apply immediately".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaintenancePlan {
    /// Delete cookies whose expiry has passed
    pub delete_expired: bool,

    /// Delete cookies unused for more than this many days (0 disables)
    pub delete_unused_days: u32,

    /// Cap expiry at this many days from now (0 disables)
    pub expire_days: u32,
}

impl MaintenancePlan {
    /// Whether the plan would run no statement at all
    pub fn is_noop(&self) -> bool {
        !self.delete_expired && self.delete_unused_days == 0 && self.expire_days == 0
    }
}

/// Rows each statement actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AffectedRows {
    /// Rows removed by the delete-expired statement
    pub expired_deleted: usize,

    /// Rows removed by the delete-unused statement
    pub unused_deleted: usize,

    /// Rows whose expiry was shortened
    pub expiry_capped: usize,
}

impl AffectedRows {
    /// Total rows touched by the run
    pub fn total(&self) -> usize {
        self.expired_deleted + self.unused_deleted + self.expiry_capped
    }
}

/// Delete every cookie whose expiry is in the past
pub fn delete_expired(session: &Session) -> Result<usize, JanitorError> {
    Ok(session.execute(DELETE_EXPIRED_SQL, &[])?)
}

/// Delete every cookie not accessed for more than `days` days
pub fn delete_unused(session: &Session, days: u32) -> Result<usize, JanitorError> {
    let us = days_to_micros(days);
    Ok(session.execute(DELETE_UNUSED_SQL, named_params! { ":us": us })?)
}

/// Shorten every expiry to at most `days` days from now
pub fn cap_expiry(session: &Session, days: u32) -> Result<usize, JanitorError> {
    let s = days_to_secs(days);
    Ok(session.execute(CAP_EXPIRY_SQL, named_params! { ":s": s })?)
}

/// Run the enabled statements of `plan`
///
/// The first failing statement aborts the rest; statements that already ran
/// stay committed.
pub fn run_maintenance(session: &Session, plan: &MaintenancePlan) -> Result<AffectedRows, JanitorError> {
    let mut affected = AffectedRows::default();

    if plan.delete_expired {
        affected.expired_deleted = delete_expired(session)?;
        tracing::debug!("Deleted {} expired cookies", affected.expired_deleted);
    }

    if plan.delete_unused_days > 0 {
        affected.unused_deleted = delete_unused(session, plan.delete_unused_days)?;
        tracing::debug!(
            "Deleted {} cookies unused for {} days",
            affected.unused_deleted,
            plan.delete_unused_days
        );
    }

    if plan.expire_days > 0 {
        affected.expiry_capped = cap_expiry(session, plan.expire_days)?;
        tracing::debug!(
            "Capped expiry of {} cookies to {} days",
            affected.expiry_capped,
            plan.expire_days
        );
    }

    Ok(affected)
}
