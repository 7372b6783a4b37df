//! Two-dimensional age × size histogram of byte totals.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buckets::{AGE_BUCKETS, BucketTable, SIZE_BUCKETS, age_in_days};

/// Errors from combining histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistogramError {
    /// The two histograms were built over different bucket tables.
    #[error("Histogram shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Byte totals indexed by `[age bucket][size bucket]`, plus the overall
/// total.
///
/// Mutating methods take `&mut self`; share a histogram across threads
/// only behind a lock, or use
/// [`categorize_by_age_and_size`](Self::categorize_by_age_and_size) to
/// derive updated copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    ages: &'static BucketTable,
    sizes: &'static BucketTable,
    cells: Vec<Vec<u64>>,
    total_size: u64,
}

impl Histogram {
    /// Create an empty histogram over the standard age and size tables.
    pub fn new() -> Self {
        Self::with_tables(&AGE_BUCKETS, &SIZE_BUCKETS)
    }

    /// Create an empty histogram over custom tables.
    pub fn with_tables(ages: &'static BucketTable, sizes: &'static BucketTable) -> Self {
        Self {
            ages,
            sizes,
            cells: vec![vec![0; sizes.len()]; ages.len()],
            total_size: 0,
        }
    }

    /// `(age buckets, size buckets)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ages.len(), self.sizes.len())
    }

    /// Age axis table.
    pub fn age_table(&self) -> &'static BucketTable {
        self.ages
    }

    /// Size axis table.
    pub fn size_table(&self) -> &'static BucketTable {
        self.sizes
    }

    /// All cells, one row per age bucket.
    pub fn cells(&self) -> &[Vec<u64>] {
        &self.cells
    }

    /// Bytes in one cell. Panics if out of range.
    pub fn cell(&self, age: usize, size: usize) -> u64 {
        self.cells[age][size]
    }

    /// Total bytes categorized.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Cell a file falls into.
    pub fn bucket_of(
        &self,
        now: DateTime<Utc>,
        modified: DateTime<Utc>,
        size: u64,
    ) -> (usize, usize) {
        let age = self.ages.bucket_for(age_in_days(modified, now));
        let sz = self.sizes.bucket_for(size);
        (age, sz)
    }

    /// Add a file, aging it against the current time.
    pub fn categorize_file(&mut self, modified: DateTime<Utc>, size: u64) {
        self.categorize_file_at(Utc::now(), modified, size);
    }

    /// Add a file, aging it against `now`.
    pub fn categorize_file_at(&mut self, now: DateTime<Utc>, modified: DateTime<Utc>, size: u64) {
        let (age, sz) = self.bucket_of(now, modified, size);
        self.cells[age][sz] += size;
        self.total_size += size;
    }

    /// Return a copy with the file added, leaving `self` untouched.
    ///
    /// Costs a full matrix copy per call.
    #[must_use]
    pub fn categorize_by_age_and_size(&self, modified: DateTime<Utc>, size: u64) -> Histogram {
        self.categorize_by_age_and_size_at(Utc::now(), modified, size)
    }

    /// Copy-on-write variant of [`categorize_file_at`](Self::categorize_file_at).
    #[must_use]
    pub fn categorize_by_age_and_size_at(
        &self,
        now: DateTime<Utc>,
        modified: DateTime<Utc>,
        size: u64,
    ) -> Histogram {
        let mut copy = self.clone();
        copy.categorize_file_at(now, modified, size);
        copy
    }

    /// Add every cell of `other` into `self`.
    ///
    /// # Panics
    ///
    /// Panics if the histograms have different shapes.
    pub fn add_to(&mut self, other: &Histogram) {
        if let Err(err) = self.try_add_to(other) {
            panic!("{err}");
        }
    }

    /// Add every cell of `other` into `self`, failing on a shape mismatch.
    pub fn try_add_to(&mut self, other: &Histogram) -> Result<(), HistogramError> {
        if self.shape() != other.shape() {
            return Err(HistogramError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }

        for (row, other_row) in self.cells.iter_mut().zip(&other.cells) {
            for (cell, value) in row.iter_mut().zip(other_row) {
                *cell += value;
            }
        }
        self.total_size += other.total_size;
        Ok(())
    }

    /// Serializable form of the histogram.
    pub fn to_report(&self) -> HistogramReport {
        HistogramReport {
            values: self.cells.clone(),
            total_size: self.total_size,
            age_buckets: self.ages.labels(),
            size_buckets: self.sizes.labels(),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for value in row {
                write!(f, "{value:10}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Serializable categorization result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramReport {
    /// Byte totals, one row per age bucket.
    pub values: Vec<Vec<u64>>,
    /// Total bytes categorized.
    pub total_size: u64,
    /// Age bucket labels, row order.
    pub age_buckets: Vec<String>,
    /// Size bucket labels, column order.
    pub size_buckets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buckets::Bucket;
    use chrono::Duration;

    const ONE_BUCKET: &[Bucket] = &[Bucket::new("All", "all", 0)];
    static ONE: BucketTable = BucketTable::new(ONE_BUCKET);

    #[test]
    fn test_new_is_empty() {
        let h = Histogram::new();
        assert_eq!(h.shape(), (7, 7));
        assert_eq!(h.total_size(), 0);
        assert!(h.cells().iter().flatten().all(|v| *v == 0));
    }

    #[test]
    fn test_categorize_file_at() {
        let now = Utc::now();
        let mut h = Histogram::new();
        h.categorize_file_at(now, now - Duration::days(400), 5 * 1024 * 1024);
        h.categorize_file_at(now, now, 10);

        assert_eq!(h.cell(4, 1), 5 * 1024 * 1024);
        assert_eq!(h.cell(0, 0), 10);
        assert_eq!(h.total_size(), 5 * 1024 * 1024 + 10);
    }

    #[test]
    fn test_display_is_fixed_width() {
        let mut h = Histogram::with_tables(&ONE, &ONE);
        h.categorize_file_at(Utc::now(), Utc::now(), 42);
        assert_eq!(h.to_string(), "        42\n");
    }

    #[test]
    fn test_try_add_to_shape_mismatch() {
        let mut a = Histogram::new();
        let b = Histogram::with_tables(&ONE, &SIZE_BUCKETS);
        let err = a.try_add_to(&b).unwrap_err();
        assert_eq!(
            err,
            HistogramError::ShapeMismatch {
                expected: (7, 7),
                found: (1, 7),
            }
        );
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn test_add_to_panics_on_mismatch() {
        let mut a = Histogram::new();
        a.add_to(&Histogram::with_tables(&ONE, &ONE));
    }

    #[test]
    fn test_report_labels() {
        let report = Histogram::new().to_report();
        assert_eq!(report.age_buckets[1], "ThirtyDays");
        assert_eq!(report.size_buckets[1], "SizeGt1MB");
        assert_eq!(report.values.len(), 7);
    }
}
