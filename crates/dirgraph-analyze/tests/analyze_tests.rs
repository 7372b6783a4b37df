use chrono::{DateTime, Duration, TimeZone, Utc};
use dirgraph_analyze::{
    AGE_BUCKETS, CategorizeError, Categorizer, Histogram, HistogramReport, SIZE_BUCKETS,
};
use dirgraph_core::{DirectoryNode, FileNode, GraphStore, NodeId};
use dirgraph_store::MemoryGraphStore;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn size(label: &str) -> usize {
    SIZE_BUCKETS.index_of(label).unwrap()
}

fn age(label: &str) -> usize {
    AGE_BUCKETS.index_of(label).unwrap()
}

#[test]
fn test_size_bucket_boundaries() {
    assert_eq!(SIZE_BUCKETS.bucket_for(0), size("SizeAny"));
    assert_eq!(SIZE_BUCKETS.bucket_for(1_048_575), size("SizeAny"));
    assert_eq!(SIZE_BUCKETS.bucket_for(1_048_576), size("SizeGt1MB"));
    assert_eq!(SIZE_BUCKETS.bucket_for(10 * 1_048_576 - 1), size("SizeGt1MB"));
    assert_eq!(SIZE_BUCKETS.bucket_for(10 * 1_048_576), size("SizeGt10MB"));
    assert_eq!(SIZE_BUCKETS.bucket_for(1 << 30), size("SizeGt1GB"));
    assert_eq!(SIZE_BUCKETS.bucket_for(100 << 30), size("SizeGt100GB"));
    assert_eq!(SIZE_BUCKETS.bucket_for(u64::MAX), size("SizeGt100GB"));
}

#[test]
fn test_age_bucket_boundaries() {
    assert_eq!(AGE_BUCKETS.bucket_for(0), age("AnyAge"));
    assert_eq!(AGE_BUCKETS.bucket_for(29), age("AnyAge"));
    assert_eq!(AGE_BUCKETS.bucket_for(30), age("ThirtyDays"));
    assert_eq!(AGE_BUCKETS.bucket_for(89), age("ThirtyDays"));
    assert_eq!(AGE_BUCKETS.bucket_for(90), age("NinetyDays"));
    assert_eq!(AGE_BUCKETS.bucket_for(180), age("SixMonths"));
    assert_eq!(AGE_BUCKETS.bucket_for(365), age("OneYear"));
    assert_eq!(AGE_BUCKETS.bucket_for(730), age("TwoYears"));
    assert_eq!(AGE_BUCKETS.bucket_for(2554), age("TwoYears"));
    assert_eq!(AGE_BUCKETS.bucket_for(2555), age("SevenYears"));
}

#[test]
fn test_bucket_for_is_highest_matching_threshold() {
    for table in [&SIZE_BUCKETS, &AGE_BUCKETS] {
        for bucket in table.iter() {
            for value in [bucket.threshold, bucket.threshold + 1] {
                let expected = table
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.threshold <= value)
                    .map(|(i, _)| i)
                    .max()
                    .unwrap();
                assert_eq!(table.bucket_for(value), expected);
            }
        }
    }
}

fn sample(seed: u64) -> Histogram {
    let mut h = Histogram::new();
    for i in 0..5u64 {
        let days = (seed * 37 + i * 211) % 3000;
        let bytes = (seed + 1) * (i + 1) * 700_000;
        h.categorize_file_at(now(), now() - Duration::days(days as i64), bytes);
    }
    h
}

#[test]
fn test_add_to_is_commutative() {
    let a = sample(1);
    let b = sample(2);

    let mut ab = a.clone();
    ab.add_to(&b);
    let mut ba = b.clone();
    ba.add_to(&a);

    assert_eq!(ab.cells(), ba.cells());
    assert_eq!(ab.total_size(), a.total_size() + b.total_size());
    assert_eq!(ab.total_size(), ba.total_size());
}

#[test]
fn test_add_to_is_associative() {
    let (a, b, c) = (sample(3), sample(4), sample(5));

    let mut left = a.clone();
    left.add_to(&b);
    left.add_to(&c);

    let mut bc = b.clone();
    bc.add_to(&c);
    let mut right = a.clone();
    right.add_to(&bc);

    assert_eq!(left, right);
}

#[test]
fn test_copy_on_write_leaves_receiver_untouched() {
    let original = sample(7);
    let before = original.clone();
    let modified = now() - Duration::days(100);
    let bytes = 20 * 1_048_576;

    let updated = original.categorize_by_age_and_size_at(now(), modified, bytes);

    assert_eq!(original, before);
    let (a, s) = (age("NinetyDays"), size("SizeGt10MB"));
    for (i, row) in updated.cells().iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let expected = before.cell(i, j) + if (i, j) == (a, s) { bytes } else { 0 };
            assert_eq!(*value, expected);
        }
    }
    assert_eq!(updated.total_size(), before.total_size() + bytes);
}

#[test]
fn test_report_serializes_matrix_and_total() {
    let mut h = Histogram::new();
    h.categorize_file_at(now(), now() - Duration::days(40), 2_097_152);

    let json = serde_json::to_string(&h.to_report()).unwrap();
    let report: HistogramReport = serde_json::from_str(&json).unwrap();
    assert_eq!(report.total_size, 2_097_152);
    assert_eq!(report.values[age("ThirtyDays")][size("SizeGt1MB")], 2_097_152);
}

fn ingest_tree(store: &MemoryGraphStore) -> NodeId {
    let root = store.create_node(DirectoryNode::new("/data").into()).unwrap();
    let sub = store.create_node(DirectoryNode::new("/data/a").into()).unwrap();
    let file = store
        .create_node(FileNode::new("/data/a/f.txt", 2_097_152, now() - Duration::days(40)).into())
        .unwrap();
    store.create_edge(root, sub).unwrap();
    store.create_edge(sub, file).unwrap();
    root
}

#[test]
fn test_categorize_subtree() {
    let store = MemoryGraphStore::new();
    ingest_tree(&store);

    let report = Categorizer::at(now()).categorize(&store, "/data").unwrap();

    assert_eq!(report.files_found, 1);
    assert_eq!(report.unreadable, 0);
    assert_eq!(report.histogram.total_size(), 2_097_152);
    let (a, s) = (age("ThirtyDays"), size("SizeGt1MB"));
    for (i, row) in report.histogram.cells().iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let expected = if (i, j) == (a, s) { 2_097_152 } else { 0 };
            assert_eq!(*value, expected);
        }
    }
}

#[test]
fn test_categorize_missing_root() {
    let store = MemoryGraphStore::new();
    let err = Categorizer::at(now())
        .categorize(&store, "/nowhere")
        .unwrap_err();
    assert!(matches!(err, CategorizeError::DirectoryNotFound { .. }));
}

#[test]
fn test_categorize_many_merges_runs() {
    let store = MemoryGraphStore::new();
    for run in ["/scan000", "/scan001"] {
        let root = store.create_node(DirectoryNode::new(run).into()).unwrap();
        let file = store
            .create_node(FileNode::new(format!("{run}/f"), 1000, now()).into())
            .unwrap();
        store.create_edge(root, file).unwrap();
    }

    let roots = vec!["/scan000".to_string(), "/scan001".to_string()];
    let report = Categorizer::at(now()).categorize_many(&store, &roots).unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.roots.len(), 2);
    assert_eq!(report.histogram.cell(0, 0), 2000);
    assert_eq!(report.histogram.total_size(), 2000);
}

#[test]
fn test_depth_limit() {
    let store = MemoryGraphStore::new();
    ingest_tree(&store);

    let report = Categorizer::at(now())
        .with_max_depth(1)
        .categorize(&store, "/data")
        .unwrap();
    assert_eq!(report.files_found, 0);
}
