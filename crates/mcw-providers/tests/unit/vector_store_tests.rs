//! Behavior tests for the filesystem vector store.

use mcw_providers::embedding::HashEmbeddingProvider;
use mcw_providers::vector_store::FsVectorStore;

use mcw_domain::ports::{
    EmbeddingProvider, OrderBy, StoredRecord, TableKind, TableRef, VectorStore, WriteOp,
};
use mcw_domain::value_objects::Namespace;

fn table(ns: &str) -> TableRef {
    TableRef::new(Namespace::parse(ns).expect("namespace"), TableKind::WorkItems)
}

fn record(id: &str, title: &str, updated_at: &str, vector: Option<Vec<f32>>) -> StoredRecord {
    StoredRecord {
        id: id.to_owned(),
        fields: serde_json::json!({ "title": title, "updated_at": updated_at }),
        search_text: title.to_owned(),
        vector,
    }
}

async fn embed(provider: &HashEmbeddingProvider, text: &str) -> Vec<f32> {
    provider.embed(text).await.expect("embed").vector
}

#[tokio::test]
async fn upsert_get_delete_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let t = table("default");

    store
        .upsert(&t, record("a", "First item", "2026-01-01T00:00:00Z", None))
        .await
        .expect("upsert");
    let fetched = store.get(&t, "a").await.expect("get").expect("present");
    assert_eq!(fetched.fields["title"], "First item");

    assert!(store.delete(&t, "a").await.expect("delete"));
    assert!(!store.delete(&t, "a").await.expect("second delete is no-op"));
    assert!(store.get(&t, "a").await.expect("get").is_none());
}

#[tokio::test]
async fn scan_orders_and_limits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let t = table("default");

    for (id, ts) in [("a", "2026-01-01T00:00:00Z"), ("b", "2026-03-01T00:00:00Z"), ("c", "2026-02-01T00:00:00Z")] {
        store
            .upsert(&t, record(id, id, ts, None))
            .await
            .expect("upsert");
    }

    let newest_first = store
        .scan(&t, None, Some(OrderBy::desc("updated_at")), 2)
        .await
        .expect("scan");
    let ids: Vec<&str> = newest_first.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b", "c"]);
}

#[tokio::test]
async fn scan_filter_predicate_applies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let t = table("default");

    store
        .upsert(&t, record("a", "keep", "2026-01-01T00:00:00Z", None))
        .await
        .expect("upsert");
    store
        .upsert(&t, record("b", "drop", "2026-01-01T00:00:00Z", None))
        .await
        .expect("upsert");

    let filter = |fields: &serde_json::Value| fields["title"] == "keep";
    let hits = store
        .scan(&t, Some(&filter), None, 10)
        .await
        .expect("scan");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");
    assert_eq!(store.count(&t, Some(&filter)).await.expect("count"), 1);
}

#[tokio::test]
async fn vector_search_ranks_by_similarity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let provider = HashEmbeddingProvider::new(64).expect("provider");
    let t = table("default");

    let texts = [
        ("close", "CORS preflight failed with 401"),
        ("far", "database vacuum schedule nightly"),
    ];
    for (id, text) in texts {
        let vector = embed(&provider, text).await;
        store
            .upsert(&t, record(id, text, "2026-01-01T00:00:00Z", Some(vector)))
            .await
            .expect("upsert");
    }

    let query = embed(&provider, "CORS preflight 401 response").await;
    let hits = store
        .vector_topk(&t, &query, 2, None)
        .await
        .expect("vector_topk");
    assert_eq!(hits[0].record.id, "close");
}

#[tokio::test]
async fn vectorless_records_skip_vector_but_keep_keyword() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let provider = HashEmbeddingProvider::new(64).expect("provider");
    let t = table("default");

    store
        .upsert(&t, record("novec", "orphan keyword target", "2026-01-01T00:00:00Z", None))
        .await
        .expect("upsert");

    let query = embed(&provider, "orphan keyword target").await;
    let vector_hits = store
        .vector_topk(&t, &query, 10, None)
        .await
        .expect("vector_topk");
    assert!(vector_hits.is_empty());

    let keyword_hits = store
        .keyword_topk(&t, "orphan keyword", 10, None)
        .await
        .expect("keyword_topk");
    assert_eq!(keyword_hits.len(), 1);

    let hybrid_hits = store
        .hybrid_topk(&t, Some(&query), "orphan keyword", 10, None)
        .await
        .expect("hybrid_topk");
    assert_eq!(hybrid_hits.len(), 1, "hybrid keeps the keyword rank");
}

#[tokio::test]
async fn hybrid_fuses_both_rankings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let provider = HashEmbeddingProvider::new(64).expect("provider");
    let t = table("default");

    let texts = [
        ("both", "login token expiry bug"),
        ("kw-only", "unrelated semantics but login token words"),
        ("vec-only", "session credential timeout defect"),
    ];
    for (id, text) in texts {
        let vector = embed(&provider, text).await;
        store
            .upsert(&t, record(id, text, "2026-01-01T00:00:00Z", Some(vector)))
            .await
            .expect("upsert");
    }

    let query = embed(&provider, "login token expiry").await;
    let hits = store
        .hybrid_topk(&t, Some(&query), "login token expiry", 3, None)
        .await
        .expect("hybrid_topk");
    assert_eq!(hits[0].record.id, "both", "present in both rankings wins");
}

#[tokio::test]
async fn batch_apply_is_atomic_and_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let t = table("default");
    {
        let store = FsVectorStore::open(dir.path()).expect("open");
        store
            .apply(
                &t,
                vec![
                    WriteOp::Put(record("a", "one", "2026-01-01T00:00:00Z", None)),
                    WriteOp::Put(record("b", "two", "2026-01-01T00:00:00Z", None)),
                    WriteOp::Delete("a".to_owned()),
                ],
            )
            .await
            .expect("apply");
    }
    // A fresh store sees the committed state from disk.
    let store = FsVectorStore::open(dir.path()).expect("reopen");
    assert!(store.get(&t, "a").await.expect("get").is_none());
    assert!(store.get(&t, "b").await.expect("get").is_some());
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsVectorStore::open(dir.path()).expect("open");
    let alpha = table("alpha");
    let beta = table("beta");

    store
        .upsert(&alpha, record("x", "alpha item", "2026-01-01T00:00:00Z", None))
        .await
        .expect("upsert");

    assert!(store.get(&beta, "x").await.expect("get").is_none());
    assert!(
        store
            .keyword_topk(&beta, "alpha item", 10, None)
            .await
            .expect("keyword")
            .is_empty()
    );

    store
        .drop_namespace(&Namespace::parse("alpha").expect("ns"))
        .await
        .expect("drop");
    assert!(store.get(&alpha, "x").await.expect("get").is_none());
}
