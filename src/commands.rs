//! Implementations of the CLI commands.

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use dirgraph_analyze::{CategoryReport, Categorizer};
use dirgraph_core::{Collection, GraphStore, IngestConfig, NodeId, TRAVERSAL_MAX_DEPTH};
use dirgraph_ingest::{IngestPipeline, ScanPlan, run_scan};
use dirgraph_store::MemoryGraphStore;
use serde_json::json;

use crate::OutputFormat;

fn open(store_path: &Path) -> Result<MemoryGraphStore> {
    MemoryGraphStore::load(store_path)
        .wrap_err_with(|| format!("Failed to open store {}", store_path.display()))
}

fn save(store: &MemoryGraphStore, store_path: &Path) -> Result<()> {
    store
        .save(store_path)
        .wrap_err_with(|| format!("Failed to save store {}", store_path.display()))
}

/// Empty the edge, directory and file collections.
pub fn truncate(store_path: &Path) -> Result<()> {
    let store = open(store_path)?;
    truncate_all(&store)?;
    save(&store, store_path)
}

fn truncate_all<S: GraphStore + ?Sized>(store: &S) -> Result<u64> {
    let mut total = 0;
    for collection in [Collection::Edges, Collection::Directories, Collection::Files] {
        let removed = store.truncate(collection)?;
        tracing::info!(%collection, removed, "truncated collection");
        total += removed;
    }
    Ok(total)
}

/// Remove every node below each root of the plan, roots included.
pub fn clean(store_path: &Path, plan: &ScanPlan) -> Result<()> {
    let store = open(store_path)?;
    for root in plan.roots() {
        clean_subtree(&store, &root)?;
    }
    save(&store, store_path)
}

fn clean_subtree<S: GraphStore + ?Sized>(store: &S, root: &str) -> Result<u64> {
    tracing::info!(root, "deleting directory entries");
    let start = store
        .lookup_directory(root)
        .wrap_err_with(|| format!("Failed querying directory {root}"))?
        .ok_or_else(|| eyre!("Directory not found: {root}"))?;

    // Collect first; removing while the traversal is live would cut it short.
    let ids: Vec<NodeId> = store
        .traverse(start, None, TRAVERSAL_MAX_DEPTH)
        .wrap_err_with(|| format!("Failed querying graph starting at {root}"))?
        .filter_map(|item| match item {
            Ok((id, _)) => Some(id),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read traversal item");
                None
            }
        })
        .collect();

    let mut removed = 0;
    for id in ids {
        match store.remove_node(id) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(err) => tracing::warn!(%id, error = %err, "failed to remove node"),
        }
    }

    tracing::info!(root, removed, "deleting directory entries complete");
    Ok(removed)
}

/// Walk the plan's target into the store.
pub async fn scan(store_path: &Path, plan: &ScanPlan, config: IngestConfig) -> Result<()> {
    let store = Arc::new(open(store_path)?);
    let mut pipeline = IngestPipeline::new(Arc::clone(&store), config);
    pipeline.start();

    let walked = run_scan(&pipeline, plan).await;
    let counters = pipeline
        .shutdown()
        .await
        .wrap_err("Ingestion pipeline failed")?;
    let summary = walked.wrap_err_with(|| format!("Failed scanning {}", plan.path.display()))?;

    save(&store, store_path)?;
    let counts = store.counts()?;
    eprintln!(
        "Scanned {} run(s): {} directories, {} files ({})",
        summary.runs,
        counters.directories_processed,
        counters.files_processed,
        format_size(summary.bytes)
    );
    eprintln!(
        "Store now holds {} directories, {} files, {} edges",
        counts.directories, counts.files, counts.edges
    );
    Ok(())
}

/// Categorize the files below each root of the plan and print the result.
pub fn count(store_path: &Path, plan: &ScanPlan, format: OutputFormat) -> Result<()> {
    let store = open(store_path)?;
    let report = Categorizer::new()
        .categorize_many(&store, &plan.roots())
        .wrap_err("Categorization failed")?;

    match format {
        OutputFormat::Text => {
            println!("Found {} files", report.files_found);
            println!();
            print!("{}", render_table(&report));
        }
        OutputFormat::Json => {
            let output = json!({
                "roots": report.roots,
                "files_found": report.files_found,
                "unreadable": report.unreadable,
                "histogram": report.histogram.to_report(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

const LABEL_WIDTH: usize = 12;
const CELL_WIDTH: usize = 12;

/// Human-readable age × size table.
fn render_table(report: &CategoryReport) -> String {
    let histogram = &report.histogram;
    let ages = histogram.age_table();
    let sizes = histogram.size_table();
    let mut out = String::new();

    out.push_str(&format!("{:<LABEL_WIDTH$}", ""));
    for bucket in sizes.iter() {
        out.push_str(&format!("{:>CELL_WIDTH$}", bucket.description));
    }
    out.push('\n');
    out.push_str(&"─".repeat(LABEL_WIDTH + CELL_WIDTH * sizes.len()));
    out.push('\n');

    for (row, age) in histogram.cells().iter().zip(ages.iter()) {
        out.push_str(&format!("{:<LABEL_WIDTH$}", age.description));
        for value in row {
            out.push_str(&format!("{:>CELL_WIDTH$}", format_size(*value)));
        }
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("Total: {}\n", format_size(histogram.total_size())));
    out
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dirgraph_core::{DirectoryNode, FileNode};
    use tempfile::TempDir;

    fn sample(store: &MemoryGraphStore) {
        let data = store.create_node(DirectoryNode::new("/data").into()).unwrap();
        let a = store.create_node(DirectoryNode::new("/data/a").into()).unwrap();
        let other = store.create_node(DirectoryNode::new("/other").into()).unwrap();
        let modified = Utc::now() - Duration::days(40);
        let f = store
            .create_node(FileNode::new("/data/a/f.txt", 2_097_152, modified).into())
            .unwrap();
        let g = store
            .create_node(FileNode::new("/other/g", 1, Utc::now()).into())
            .unwrap();
        store.create_edge(data, a).unwrap();
        store.create_edge(a, f).unwrap();
        store.create_edge(other, g).unwrap();
    }

    #[test]
    fn test_clean_removes_subtree_only() {
        let store = MemoryGraphStore::new();
        sample(&store);

        let removed = clean_subtree(&store, "/data").unwrap();

        assert_eq!(removed, 3);
        let counts = store.counts().unwrap();
        assert_eq!(counts.directories, 1);
        assert_eq!(counts.files, 1);
        assert_eq!(counts.edges, 1);
        assert!(store.lookup_directory("/other").unwrap().is_some());
    }

    #[test]
    fn test_clean_missing_root() {
        let store = MemoryGraphStore::new();
        assert!(clean_subtree(&store, "/nowhere").is_err());
    }

    #[test]
    fn test_truncate_all() {
        let store = MemoryGraphStore::new();
        sample(&store);

        assert_eq!(truncate_all(&store).unwrap(), 8);
        assert_eq!(store.counts().unwrap(), Default::default());
    }

    #[test]
    fn test_truncate_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.json");
        let store = MemoryGraphStore::new();
        sample(&store);
        store.save(&path).unwrap();

        truncate(&path).unwrap();

        let reopened = MemoryGraphStore::load(&path).unwrap();
        assert_eq!(reopened.counts().unwrap().directories, 0);
    }

    #[test]
    fn test_render_table() {
        let store = MemoryGraphStore::new();
        sample(&store);
        let report = Categorizer::new().categorize(&store, "/data").unwrap();

        let table = render_table(&report);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains(">1MB"));
        assert!(lines[3].starts_with("30 days"));
        assert!(lines[3].contains("2 MiB"));
        assert!(table.ends_with("Total: 2 MiB\n"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scan_then_count_roots() {
        let tree = TempDir::new().unwrap();
        std::fs::create_dir(tree.path().join("a")).unwrap();
        std::fs::write(tree.path().join("a/f.txt"), vec![0u8; 4096]).unwrap();

        let temp = TempDir::new().unwrap();
        let store_path = temp.path().join("graph.json");
        let plan = ScanPlan::new(tree.path()).with_prefix("/run");

        scan(&store_path, &plan, IngestConfig::default()).await.unwrap();

        let store = MemoryGraphStore::load(&store_path).unwrap();
        let report = Categorizer::new()
            .categorize_many(&store, &plan.roots())
            .unwrap();
        assert_eq!(report.files_found, 1);
        assert_eq!(report.histogram.total_size(), 4096);
    }
}
