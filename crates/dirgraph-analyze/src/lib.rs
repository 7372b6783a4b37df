//! Age and size categorization for dirgraph.
//!
//! Files are placed into a two-dimensional histogram: one axis is the age
//! of the file (days since last modification), the other its size. Each
//! cell accumulates the bytes of every file that falls into it.
//!
//! # Bucket tables
//!
//! Both axes are ordered threshold tables. A value belongs to the highest
//! bucket whose threshold it reaches, so a file exactly 30 days old lands in
//! `ThirtyDays`, not `AnyAge`.
//!
//! # Categorization runs
//!
//! ```rust,ignore
//! use dirgraph_analyze::Categorizer;
//! use dirgraph_store::MemoryGraphStore;
//!
//! let store = MemoryGraphStore::load("dirgraph.json").unwrap();
//! let report = Categorizer::new().categorize(&store, "/data").unwrap();
//!
//! println!("{} files, {} bytes", report.files_found, report.histogram.total_size());
//! print!("{}", report.histogram);
//! ```

pub mod buckets;
mod categorize;
mod histogram;

pub use buckets::{AGE_BUCKETS, Bucket, BucketTable, SIZE_BUCKETS, age_in_days};
pub use categorize::{CategorizeError, CategoryReport, Categorizer};
pub use histogram::{Histogram, HistogramError, HistogramReport};
