//! Crumb Domain Layer
//!
//! Core vocabulary for cookie-store maintenance. Like the rest of the domain
//! layer it has ZERO external dependencies: it defines the value objects and
//! trait interfaces that the store and janitor crates build upon.
//!
//! ## Key Concepts
//!
//! - **Expired cookie**: one whose `expiry` (epoch seconds) is in the past
//! - **Unused cookie**: one whose `lastAccessed` (epoch microseconds) is older
//!   than a configured number of days
//! - **Expiry cap**: shortening a cookie's `expiry` to at most N days from now
//! - **Bucket**: a candidate day threshold previewed alongside the configured one
//! - **Metrics snapshot**: per-bucket counts computed before a maintenance run
//! - **Run result**: the per-feature counts reported for a single run
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - The cookie table itself belongs to the browser; nothing here models rows
//! - Configuration storage is reached through the [`traits::Preferences`] seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod outcome;
pub mod snapshot;
pub mod time;
pub mod traits;

// Re-exports for convenience
pub use bucket::{BucketSet, Buckets, DAY_INCREMENTS_LONG, DAY_INCREMENTS_SHORT};
pub use outcome::RunResult;
pub use snapshot::MetricsSnapshot;
pub use traits::{PrefValue, Preferences};
