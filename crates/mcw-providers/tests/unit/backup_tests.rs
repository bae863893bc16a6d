//! Backup and restore tests for the filesystem store.

use mcw_domain::ports::backup::NamespaceArchiver;
use mcw_domain::ports::{StoredRecord, TableKind, TableRef, VectorStore};
use mcw_domain::value_objects::Namespace;
use mcw_providers::vector_store::FsVectorStore;

fn record(id: &str, title: &str) -> StoredRecord {
    StoredRecord {
        id: id.to_owned(),
        fields: serde_json::json!({ "title": title }),
        search_text: title.to_owned(),
        vector: None,
    }
}

#[tokio::test]
async fn backup_then_restore_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let ns = Namespace::parse("demo").expect("ns");
    let items = TableRef::new(ns.clone(), TableKind::WorkItems);
    let arch = TableRef::new(ns.clone(), TableKind::Architecture);

    store.upsert(&items, record("w1", "item one")).await.expect("upsert");
    store.upsert(&items, record("w2", "item two")).await.expect("upsert");
    store.upsert(&arch, record("a1", "arch one")).await.expect("upsert");

    let descriptor = store.backup_namespace(&ns).await.expect("backup");
    assert_eq!(descriptor.manifest.counts["work_items"], 2);
    assert_eq!(descriptor.manifest.counts["architecture"], 1);

    // Mutate after the backup, then restore over it.
    store.delete(&items, "w1").await.expect("delete");
    store.upsert(&items, record("w3", "item three")).await.expect("upsert");

    let report = store
        .restore_namespace(&ns, &descriptor.archive)
        .await
        .expect("restore");
    assert_eq!(report.counts["work_items"], 2);

    assert!(store.get(&items, "w1").await.expect("get").is_some());
    assert!(store.get(&items, "w3").await.expect("get").is_none());
    assert!(store.get(&arch, "a1").await.expect("get").is_some());
}

#[tokio::test]
async fn list_backups_reports_manifests_newest_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let ns = Namespace::parse("demo").expect("ns");
    let items = TableRef::new(ns.clone(), TableKind::WorkItems);

    store.upsert(&items, record("w1", "one")).await.expect("upsert");
    let first = store.backup_namespace(&ns).await.expect("backup");
    // Archive names carry millisecond precision; keep the two apart.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.upsert(&items, record("w2", "two")).await.expect("upsert");
    let second = store.backup_namespace(&ns).await.expect("backup");

    let listed = store.list_backups().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].archive, second.archive);
    assert_eq!(listed[1].archive, first.archive);
    assert_eq!(listed[0].manifest.counts["work_items"], 2);
}

#[tokio::test]
async fn restore_unknown_archive_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let ns = Namespace::parse("demo").expect("ns");
    let err = store
        .restore_namespace(&ns, "missing.tar.gz")
        .await
        .expect_err("should fail");
    assert_eq!(err.code(), "ErrNotFound");
}
