//! Pre-order filesystem walk and the scan driver feeding it into a pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirgraph_core::{GraphStore, PathEvent};
use jwalk::WalkDir;
use tokio::sync::mpsc;

use crate::error::{IngestError, WalkError};
use crate::pipeline::IngestPipeline;

/// Re-root an absolute path under `prefix`.
///
/// An empty prefix leaves the path unchanged.
pub fn rebase(prefix: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    if prefix.is_empty() {
        return path.into_owned();
    }
    let prefix = prefix.trim_end_matches('/');
    let rest = path.trim_start_matches('/');
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => format!("/{rest}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{rest}"),
    }
}

/// Directory events for every ancestor of `root`, outermost first.
///
/// Neither `/` nor `root` itself is included.
pub fn ancestor_events(root: &str) -> Vec<PathEvent> {
    let mut ancestors: Vec<PathEvent> = Path::new(root)
        .ancestors()
        .skip(1)
        .map(|p| p.to_string_lossy())
        .filter(|p| !p.is_empty() && p != "/")
        .map(|p| PathEvent::directory(p.into_owned()))
        .collect();
    ancestors.reverse();
    ancestors
}

/// Walk `root` in pre-order (parents before children, siblings by name),
/// recording every path re-rooted under `prefix`.
///
/// The root is canonicalized first and is itself the first event. Errors
/// on individual entries are yielded and end the scan in [`run_scan`].
pub fn walk_events(
    root: &Path,
    prefix: &str,
) -> Result<impl Iterator<Item = Result<PathEvent, WalkError>>, WalkError> {
    let root = root.canonicalize().map_err(|source| WalkError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        return Err(WalkError::NotADirectory { path: root });
    }

    let prefix = prefix.to_string();
    let walker = WalkDir::new(&root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .min_depth(0);

    Ok(walker.into_iter().map(move |entry| {
        let entry = entry.map_err(|source| WalkError::Entry { source })?;
        let path = rebase(&prefix, &entry.path());

        if entry.file_type().is_dir() {
            return Ok(PathEvent::directory(path));
        }

        let metadata = entry.metadata().map_err(|source| WalkError::Entry { source })?;
        let modified: DateTime<Utc> = metadata
            .modified()
            .unwrap_or(std::time::UNIX_EPOCH)
            .into();
        Ok(PathEvent::file(path, metadata.len(), modified))
    }))
}

/// What to scan and how many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    /// Directory to walk.
    pub path: PathBuf,
    /// Number of repeated runs; 0 means a single run with the prefix as is.
    pub count: u32,
    /// Suffix of the first run.
    pub start: u32,
    /// Prefix recorded paths are re-rooted under.
    pub prefix: String,
}

impl ScanPlan {
    /// A single run over `path` with no prefix.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            count: 0,
            start: 0,
            prefix: String::new(),
        }
    }

    /// Set the prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Repeat the scan `count` times, suffixing the prefix with a
    /// three-digit run number starting at `start`.
    pub fn with_runs(mut self, count: u32, start: u32) -> Self {
        self.count = count;
        self.start = start;
        self
    }

    /// Prefix of each run, in order.
    pub fn prefixes(&self) -> Vec<String> {
        if self.count == 0 {
            return vec![self.prefix.clone()];
        }
        (0..self.count)
            .map(|i| format!("{}{:03}", self.prefix, self.start + i))
            .collect()
    }

    /// The target path, canonicalized when it exists locally.
    pub fn canonical_path(&self) -> PathBuf {
        self.path.canonicalize().unwrap_or_else(|_| self.path.clone())
    }

    /// Recorded root directory of each run.
    pub fn roots(&self) -> Vec<String> {
        let path = self.canonical_path();
        self.prefixes()
            .iter()
            .map(|prefix| rebase(prefix, &path))
            .collect()
    }
}

/// Totals for a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Runs completed.
    pub runs: u32,
    /// Directory events sent, ancestors included.
    pub directories: u64,
    /// File events sent.
    pub files: u64,
    /// Bytes across all file events.
    pub bytes: u64,
}

/// Walk every run of `plan` and feed the events into `pipeline`.
///
/// Sends block while the pipeline is backed up, so the pipeline should be
/// started first. Returns once every event has been handed over; call
/// [`IngestPipeline::shutdown`] to wait for them to be stored.
pub async fn run_scan<S: GraphStore + ?Sized + 'static>(
    pipeline: &IngestPipeline<S>,
    plan: &ScanPlan,
) -> Result<ScanSummary, IngestError> {
    let tx = pipeline.sender();
    let plan = plan.clone();
    let summary = tokio::task::spawn_blocking(move || feed(&tx, &plan)).await??;
    Ok(summary)
}

fn feed(tx: &mpsc::Sender<PathEvent>, plan: &ScanPlan) -> Result<ScanSummary, WalkError> {
    let mut summary = ScanSummary::default();
    let path = plan.canonical_path();

    for prefix in plan.prefixes() {
        let root = rebase(&prefix, &path);
        tracing::info!(root = %root, "scan run started");

        for event in ancestor_events(&root) {
            summary.directories += 1;
            send(tx, event)?;
        }
        for event in walk_events(&plan.path, &prefix)? {
            let event = event?;
            if event.is_dir() {
                summary.directories += 1;
            } else {
                summary.files += 1;
                summary.bytes += event.size;
            }
            send(tx, event)?;
        }

        summary.runs += 1;
        tracing::info!(
            root = %root,
            directories = summary.directories,
            files = summary.files,
            "scan run complete"
        );
    }

    Ok(summary)
}

fn send(tx: &mpsc::Sender<PathEvent>, event: PathEvent) -> Result<(), WalkError> {
    tx.blocking_send(event)
        .map_err(|err| WalkError::PipelineClosed { path: err.0.path })
}
