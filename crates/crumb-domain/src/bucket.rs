//! Bucket module - candidate day thresholds previewed in a snapshot

/// Day offsets previewed for the delete-unused feature
pub const DAY_INCREMENTS_SHORT: [u32; 9] = [7, 14, 30, 60, 91, 182, 273, 365, 547];

/// Day offsets previewed for the expiry cap feature
pub const DAY_INCREMENTS_LONG: [u32; 12] = [7, 14, 30, 60, 91, 182, 273, 365, 547, 730, 1095, 1825];

/// An ordered set of day thresholds
///
/// Always sorted ascending, without duplicates, and never containing zero
/// (zero means "disabled" and has nothing to preview).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Buckets(Vec<u32>);

impl Buckets {
    /// Build a bucket list from arbitrary day values
    pub fn new(days: impl IntoIterator<Item = u32>) -> Self {
        let mut days: Vec<u32> = days.into_iter().filter(|d| *d > 0).collect();
        days.sort_unstable();
        days.dedup();
        Self(days)
    }

    /// Return a copy that also contains `day` (no-op for zero)
    pub fn with(&self, day: u32) -> Self {
        Self::new(self.0.iter().copied().chain(std::iter::once(day)))
    }

    /// Whether `day` is one of the thresholds
    pub fn contains(&self, day: u32) -> bool {
        self.0.binary_search(&day).is_ok()
    }

    /// Iterate the thresholds in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Number of thresholds
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no thresholds
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Thresholds as a slice
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// The two bucket lists a snapshot is computed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet {
    /// Thresholds for the "unused for more than d days" counts
    pub unused: Buckets,

    /// Thresholds for the "expires more than d days from now" counts
    pub long_lived: Buckets,
}

impl Default for BucketSet {
    fn default() -> Self {
        Self {
            unused: Buckets::new(DAY_INCREMENTS_SHORT),
            long_lived: Buckets::new(DAY_INCREMENTS_LONG),
        }
    }
}

impl BucketSet {
    /// Create a bucket set from explicit day lists
    pub fn new(
        unused: impl IntoIterator<Item = u32>,
        long_lived: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            unused: Buckets::new(unused),
            long_lived: Buckets::new(long_lived),
        }
    }

    /// Extend the lists so the configured thresholds are always counted
    ///
    /// A disabled feature (zero days) adds nothing.
    pub fn including(&self, unused_days: u32, expire_days: u32) -> Self {
        Self {
            unused: self.unused.with(unused_days),
            long_lived: self.long_lived.with(expire_days),
        }
    }
}
