//! Run notifications for the host application

use crate::{AffectedRows, JanitorError, Ledger};
use crumb_domain::RunResult;
use std::fmt;

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The user asked for a run ("run now")
    Manual,
    /// The background worker fired
    Scheduled,
}

impl Trigger {
    /// Get the trigger name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a host needs to report a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// What started the run
    pub trigger: Trigger,

    /// Counts reported for the run (taken from the pre-run snapshot)
    pub result: RunResult,

    /// Rows each statement actually changed
    ///
    /// Can be lower than `result` when delete-expired and delete-unused
    /// overlap: the ledger still counts both.
    pub affected: AffectedRows,

    /// Lifetime counters after this run
    pub ledger: Ledger,

    /// Completion time, epoch seconds
    pub finished_at: u64,
}

impl RunSummary {
    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let lines = [
            format!("Cookie maintenance ({})", self.trigger),
            format!("=========================="),
            format!("Result: {}", self.result),
            format!("  Expired deleted: {}", self.result.deleted_expired),
            format!("  Unused deleted: {}", self.result.deleted_unused),
            format!("  Expiry capped: {}", self.result.expiry_capped),
            format!("Rows changed: {}", self.affected.total()),
            format!(""),
            format!("Lifetime totals:"),
            format!("  Expired deleted: {}", self.ledger.delete_expired),
            format!("  Unused deleted: {}", self.ledger.delete_unused),
            format!("  Expiry capped: {}", self.ledger.expire),
        ];
        lines.join("\n")
    }
}

/// Callback interface for hosts that render run results
///
/// Observers are called from the blocking-pool task that ran the pipeline,
/// after the ledger has been persisted and before the next run may start;
/// they should return quickly.
pub trait RunObserver: Send + Sync {
    /// Called after every successful run
    fn on_run_complete(&self, summary: &RunSummary);

    /// Called when a run fails; the ledger keeps its pre-run counts
    fn on_run_failed(&self, _trigger: Trigger, _error: &JanitorError) {}
}
