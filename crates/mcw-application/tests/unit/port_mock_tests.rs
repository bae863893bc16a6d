//! Port-mock tests: provider failures must surface through the services
//! with the right taxonomy code instead of panicking or being swallowed.

use std::sync::Arc;

use mcw_application::SearchServiceImpl;
use mcw_domain::error::{Error, Result};
use mcw_domain::ops::{ItemFormat, SearchContentArgs, SearchType};
use mcw_domain::ports::{EmbeddingProvider, SearchServiceInterface};
use mcw_domain::value_objects::{Embedding, Namespace};
use mcw_providers::vector_store::FsVectorStore;

mockall::mock! {
    pub Embedder {}

    #[async_trait::async_trait]
    impl EmbeddingProvider for Embedder {
        async fn embed(&self, text: &str) -> Result<Embedding>;
        fn dimensions(&self) -> usize;
        fn name(&self) -> &'static str;
    }
}

fn search_args(search_type: SearchType) -> SearchContentArgs {
    SearchContentArgs {
        query: "anything".to_owned(),
        search_type,
        filters: None,
        limit: None,
        format: ItemFormat::Minimal,
    }
}

#[tokio::test]
async fn embedding_failure_surfaces_as_internal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FsVectorStore::open(dir.path()).expect("store"));
    let mut embedder = MockEmbedder::new();
    embedder
        .expect_embed()
        .returning(|_| Err(Error::embedding("model offline")));
    let search = SearchServiceImpl::new(store, Arc::new(embedder));

    let err = search
        .search(
            &Namespace::parse("demo").expect("ns"),
            search_args(SearchType::Semantic),
        )
        .await
        .expect_err("embedding failure must propagate");
    assert_eq!(err.code(), "ErrInternal");
}

#[tokio::test]
async fn keyword_search_never_touches_the_embedder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FsVectorStore::open(dir.path()).expect("store"));
    let mut embedder = MockEmbedder::new();
    // No expectation set: any embed call would fail the test.
    embedder.expect_embed().never();
    let search = SearchServiceImpl::new(store, Arc::new(embedder));

    let results = search
        .search(
            &Namespace::parse("demo").expect("ns"),
            search_args(SearchType::Keyword),
        )
        .await
        .expect("keyword search works without embeddings");
    assert!(results.results.is_empty());
}
