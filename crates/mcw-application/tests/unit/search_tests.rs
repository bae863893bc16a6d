//! Search tests: flavors, filters, listing.

use mcw_domain::entities::{WorkItemStatus, WorkItemType};
use mcw_domain::ops::{ItemFormat, SearchContentArgs, SearchFilters, SearchType};
use mcw_domain::ports::SearchServiceInterface;

use crate::test_support::{create, fixture, ns, set_status};

#[tokio::test]
async fn empty_hybrid_query_lists_newest_first() {
    let f = fixture();
    let demo = ns("demo");
    let older = create(&f.work_items, &demo, WorkItemType::Task, "older task", None).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = create(&f.work_items, &demo, WorkItemType::Task, "newer task", None).await;

    let results = f
        .search
        .search(
            &demo,
            SearchContentArgs {
                query: String::new(),
                search_type: SearchType::Hybrid,
                filters: None,
                limit: Some(1),
                format: ItemFormat::Summary,
            },
        )
        .await
        .expect("search");
    assert_eq!(results.results.len(), 1);
    assert_eq!(results.total_found, 2, "limit applies after counting");
    assert_eq!(
        results.results[0].item["id"],
        serde_json::to_value(newer.id).expect("id")
    );
    let _ = older;
}

#[tokio::test]
async fn keyword_search_finds_exact_terms() {
    let f = fixture();
    let demo = ns("demo");
    let target =
        create(&f.work_items, &demo, WorkItemType::Task, "fix CORS preflight", None).await;
    let _other = create(&f.work_items, &demo, WorkItemType::Task, "update readme", None).await;

    let results = f
        .search
        .search(
            &demo,
            SearchContentArgs {
                query: "CORS preflight".to_owned(),
                search_type: SearchType::Keyword,
                filters: None,
                limit: None,
                format: ItemFormat::Minimal,
            },
        )
        .await
        .expect("search");
    assert_eq!(results.results.len(), 1);
    assert_eq!(
        results.results[0].item["id"],
        serde_json::to_value(target.id).expect("id")
    );
}

#[tokio::test]
async fn filters_restrict_results() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "auth story", None).await;
    let task = create(&f.work_items, &demo, WorkItemType::Task, "auth task", None).await;
    set_status(&f.work_items, &demo, task.id, WorkItemStatus::InProgress).await;

    let results = f
        .search
        .search(
            &demo,
            SearchContentArgs {
                query: "auth".to_owned(),
                search_type: SearchType::Hybrid,
                filters: Some(SearchFilters {
                    item_type: Some(WorkItemType::Task),
                    status: Some(WorkItemStatus::InProgress),
                    priority: None,
                    parent_id: None,
                    context_tags: vec![],
                }),
                limit: None,
                format: ItemFormat::Minimal,
            },
        )
        .await
        .expect("search");
    assert_eq!(results.results.len(), 1);
    assert_eq!(
        results.results[0].item["id"],
        serde_json::to_value(task.id).expect("id")
    );
    let _ = story;
}

#[tokio::test]
async fn namespace_isolation_in_search() {
    let f = fixture();
    let alpha = ns("alpha");
    let beta = ns("beta");
    create(&f.work_items, &alpha, WorkItemType::Task, "X marks the spot", None).await;

    let results = f
        .search
        .search(
            &beta,
            SearchContentArgs {
                query: "X".to_owned(),
                search_type: SearchType::Hybrid,
                filters: None,
                limit: None,
                format: ItemFormat::Minimal,
            },
        )
        .await
        .expect("search");
    assert!(results.results.is_empty());
}
