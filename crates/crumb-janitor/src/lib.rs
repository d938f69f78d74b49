//! Crumb Janitor
//!
//! Cookie-store maintenance: previews, bulk clean-up runs and the lifetime
//! ledger, on top of the browser's `cookies.sqlite`.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Preview**: Counting, for each candidate threshold, how many cookies a
//!   run would delete or modify, without touching the store
//! - **Delete expired**: Removing cookies whose expiry has passed
//! - **Delete unused**: Removing cookies not accessed for N days
//! - **Cap expiry**: Shortening any expiry further than N days away
//! - **Ledger**: Keeping lifetime per-feature totals in the preference store
//!
//! # Architecture
//!
//! A run is a snapshot, then the mutating statements in a fixed order
//! (expired, unused, cap), then a ledger update. Only one snapshot or run
//! touches the store at a time; a second request waits for the first.
//!
//! ## Units
//!
//! | Column | Unit |
//! |--------|------|
//! | `expiry` | epoch seconds |
//! | `lastAccessed` | epoch microseconds |
//!
//! Thresholds are whole days; the current time always comes from the
//! database's own clock.
//!
//! # Usage
//!
//! ## Run Now
//!
//! ```no_run
//! use crumb_janitor::Janitor;
//! use crumb_store::{CookieDb, MemoryPrefs};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let janitor = Janitor::new(CookieDb::in_profile("profile"), MemoryPrefs::new())?;
//!
//!     let preview = janitor.preview().await?;
//!     println!("{} expired cookies", preview.expired);
//!
//!     let summary = janitor.run_now().await?;
//!     println!("{}", summary.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use crumb_janitor::{Janitor, JanitorWorker};
//! use crumb_store::{CookieDb, TomlPrefs};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let prefs = TomlPrefs::open("prefs.toml")?;
//!     let janitor = Arc::new(Janitor::new(CookieDb::in_profile("profile"), prefs)?);
//!     let mut worker = JanitorWorker::from_config(janitor)?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Settings are read from the preference store on every run. With
//! `TomlPrefs` they are flat keys under the `crumb.` prefix:
//!
//! ```toml
//! "crumb.deleteExpired.enabled" = true
//! "crumb.deleteUnused.days" = 90
//! "crumb.expire.days" = 90
//! "crumb.idle.enabled" = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod janitor;
mod ledger;
mod maintenance;
mod metrics;
mod observer;
mod worker;

#[cfg(test)]
mod test_support;

pub use config::{
    install_defaults, last_idle_run, pref_key, record_idle_run, JanitorConfig, PREF_BRANCH,
    PREF_DELETE_EXPIRED_COUNT, PREF_DELETE_EXPIRED_ENABLED, PREF_DELETE_UNUSED_COUNT,
    PREF_DELETE_UNUSED_DAYS, PREF_EXPIRE_COUNT, PREF_EXPIRE_DAYS, PREF_IDLE_ENABLED,
    PREF_IDLE_LASTRAN,
};
pub use error::JanitorError;
pub use janitor::Janitor;
pub use ledger::Ledger;
pub use maintenance::{
    cap_expiry, delete_expired, delete_unused, run_maintenance, AffectedRows, MaintenancePlan,
};
pub use metrics::{compute_snapshot, count_expired, count_long_lived, count_unused};
pub use observer::{RunObserver, RunSummary, Trigger};
pub use worker::{JanitorWorker, WorkerStats};
