//! Categorization runs over an ingested subtree.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;

use dirgraph_core::{Collection, GraphStore, StoreError, TRAVERSAL_MAX_DEPTH};

use crate::histogram::Histogram;

/// Errors that abort a categorization run.
#[derive(Debug, Error)]
pub enum CategorizeError {
    /// The starting directory was never ingested.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// The store failed while resolving the start or opening the traversal.
    #[error("Failed querying graph at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: StoreError,
    },
}

impl CategorizeError {
    fn store(path: &str, source: StoreError) -> Self {
        Self::Store {
            path: path.to_string(),
            source,
        }
    }
}

/// Result of categorizing one or more subtrees.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    /// Directories the run started from.
    pub roots: Vec<String>,
    /// Byte totals by age and size.
    pub histogram: Histogram,
    /// Number of file nodes visited.
    pub files_found: u64,
    /// Traversal items that could not be read and were skipped.
    pub unreadable: u64,
}

impl CategoryReport {
    fn empty() -> Self {
        Self {
            roots: Vec::new(),
            histogram: Histogram::new(),
            files_found: 0,
            unreadable: 0,
        }
    }

    /// Fold another report into this one.
    pub fn merge(mut self, other: CategoryReport) -> Self {
        self.roots.extend(other.roots);
        self.histogram.add_to(&other.histogram);
        self.files_found += other.files_found;
        self.unreadable += other.unreadable;
        self
    }
}

/// Builds histograms from the file nodes stored beneath a directory.
#[derive(Debug, Clone)]
pub struct Categorizer {
    reference_time: DateTime<Utc>,
    max_depth: u32,
}

impl Categorizer {
    /// Categorizer aging files against the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Categorizer aging files against a fixed reference time.
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        Self {
            reference_time,
            max_depth: TRAVERSAL_MAX_DEPTH,
        }
    }

    /// Limit how deep below the root files are collected.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reference time used for ages.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Categorize every file reachable from the directory at `root`.
    ///
    /// Unreadable traversal items are logged and skipped.
    pub fn categorize<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        root: &str,
    ) -> Result<CategoryReport, CategorizeError> {
        let start = store
            .lookup_directory(root)
            .map_err(|e| CategorizeError::store(root, e))?
            .ok_or_else(|| CategorizeError::DirectoryNotFound {
                path: root.to_string(),
            })?;

        let traversal = store
            .traverse(start, Some(Collection::Files), self.max_depth)
            .map_err(|e| CategorizeError::store(root, e))?;

        let mut report = CategoryReport::empty();
        report.roots.push(root.to_string());

        for item in traversal {
            match item {
                Ok((_, node)) => {
                    if let Some(file) = node.as_file() {
                        report.files_found += 1;
                        report
                            .histogram
                            .categorize_file_at(self.reference_time, file.modified, file.size);
                    }
                }
                Err(err) => {
                    report.unreadable += 1;
                    tracing::warn!(root, error = %err, "failed to read traversal item");
                }
            }
        }

        tracing::info!(root, files = report.files_found, "categorization complete");
        Ok(report)
    }

    /// Categorize several subtrees in parallel and merge the results.
    pub fn categorize_many<S: GraphStore + ?Sized>(
        &self,
        store: &S,
        roots: &[String],
    ) -> Result<CategoryReport, CategorizeError> {
        let reports = roots
            .par_iter()
            .map(|root| self.categorize(store, root))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reports
            .into_iter()
            .fold(CategoryReport::empty(), CategoryReport::merge))
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new()
    }
}
