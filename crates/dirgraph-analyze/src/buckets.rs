//! Ordered threshold tables for the age and size axes.

use chrono::{DateTime, Utc};
use serde::Serialize;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// One bucket of a threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Stable identifier of the bucket.
    pub label: &'static str,
    /// Short human-readable description.
    pub description: &'static str,
    /// Smallest value that belongs to this bucket.
    pub threshold: u64,
}

impl Bucket {
    /// Create a new bucket.
    pub const fn new(label: &'static str, description: &'static str, threshold: u64) -> Self {
        Self {
            label,
            description,
            threshold,
        }
    }
}

/// Buckets sorted by strictly ascending threshold, the first at zero.
///
/// A bucket's index is its position in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketTable {
    buckets: &'static [Bucket],
}

impl BucketTable {
    /// Create a table. Panics (at compile time for statics) if the table is
    /// empty, does not start at zero, or is not strictly ascending.
    pub const fn new(buckets: &'static [Bucket]) -> Self {
        assert!(!buckets.is_empty(), "bucket table must not be empty");
        assert!(buckets[0].threshold == 0, "first bucket threshold must be 0");
        let mut i = 1;
        while i < buckets.len() {
            assert!(
                buckets[i - 1].threshold < buckets[i].threshold,
                "bucket thresholds must be strictly ascending"
            );
            i += 1;
        }
        Self { buckets }
    }

    /// Index of the bucket a value falls into: the highest index whose
    /// threshold is `<= value`.
    pub fn bucket_for(&self, value: u64) -> usize {
        (0..self.buckets.len())
            .rev()
            .find(|&i| self.buckets[i].threshold <= value)
            .unwrap_or(0)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false; tables hold at least one bucket.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Bucket at an index.
    pub fn get(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index)
    }

    /// Index of the bucket with a label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.label == label)
    }

    /// Iterate buckets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.label.to_string()).collect()
    }
}

const SIZES: &[Bucket] = &[
    Bucket::new("SizeAny", "<1MB", 0),
    Bucket::new("SizeGt1MB", ">1MB", MIB),
    Bucket::new("SizeGt10MB", ">10MB", 10 * MIB),
    Bucket::new("SizeGt100MB", ">100MB", 100 * MIB),
    Bucket::new("SizeGt1GB", ">1GB", GIB),
    Bucket::new("SizeGt10GB", ">10GB", 10 * GIB),
    Bucket::new("SizeGt100GB", ">100GB", 100 * GIB),
];

const AGES: &[Bucket] = &[
    Bucket::new("AnyAge", "<30 days", 0),
    Bucket::new("ThirtyDays", "30 days", 30),
    Bucket::new("NinetyDays", "90 days", 90),
    Bucket::new("SixMonths", "6 mo", 180),
    Bucket::new("OneYear", "1 yr", 365),
    Bucket::new("TwoYears", "2 yr", 730),
    Bucket::new("SevenYears", "7 yr", 2555),
];

/// File size buckets, in bytes.
pub static SIZE_BUCKETS: BucketTable = BucketTable::new(SIZES);

/// File age buckets, in days since last modification.
pub static AGE_BUCKETS: BucketTable = BucketTable::new(AGES);

/// Whole days between `modified` and `now`. Future times count as zero.
pub fn age_in_days(modified: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - modified).num_days().max(0) as u64
}
