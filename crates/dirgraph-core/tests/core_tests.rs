use chrono::{TimeZone, Utc};
use dirgraph_core::{
    Collection, ContainsEdge, DirectoryNode, EntryKind, FileNode, IngestConfig, Node, NodeId,
    PathEvent, parent_path,
};
use std::time::Duration;

#[test]
fn test_node_collections() {
    let dir: Node = DirectoryNode::new("/data").into();
    assert!(dir.is_dir());
    assert!(!dir.is_file());
    assert_eq!(dir.collection(), Collection::Directories);
    assert_eq!(dir.path(), "/data");
    assert!(dir.as_file().is_none());

    let modified = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let file: Node = FileNode::new("/data/f.txt", 2048, modified).into();
    assert!(file.is_file());
    assert_eq!(file.collection(), Collection::Files);
    let payload = file.as_file().unwrap();
    assert_eq!(payload.size, 2048);
    assert_eq!(payload.modified, modified);
}

#[test]
fn test_file_name_component() {
    let file = FileNode::new("/data/a/report.csv", 1, Utc::now());
    assert_eq!(file.name(), "report.csv");
}

#[test]
fn test_collection_names() {
    assert_eq!(Collection::Directories.to_string(), "directories");
    assert_eq!(Collection::Files.to_string(), "files");
    assert_eq!(Collection::Edges.to_string(), "contains");
}

#[test]
fn test_edge_identity() {
    let a = ContainsEdge::new(NodeId::directory(1), NodeId::directory(2));
    let b = ContainsEdge::new(NodeId::directory(1), NodeId::directory(2));
    let c = ContainsEdge::new(NodeId::directory(1), NodeId::file(2));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_path_events() {
    let event = PathEvent::file("/data/a/f.txt", 10, Utc::now());
    assert_eq!(event.kind, EntryKind::File);
    assert_eq!(event.parent(), Some("/data/a"));

    let root = PathEvent::directory("/");
    assert!(root.is_dir());
    assert_eq!(root.parent(), None);
    assert_eq!(parent_path("/data"), Some("/"));
}

#[test]
fn test_config_round_trip_defaults() {
    let config = IngestConfig::builder()
        .worker_count(3usize)
        .cache_capacity(16usize)
        .progress_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    assert_eq!(config.worker_count, 3);
    assert_eq!(config.cache_capacity, 16);
    assert_eq!(config.worker_queue_capacity(), 30);
    assert_eq!(config.progress_interval, Duration::from_millis(10));
}
