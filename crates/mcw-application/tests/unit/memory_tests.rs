//! Memory store tests: CRUD invariants, matcher, smart context.

use mcw_domain::entities::MemoryKind;
use mcw_domain::ops::{ImportMode, MemoryPayload, MemoryUpdate, UseOutcome};
use mcw_domain::ports::MemoryServiceInterface;

use crate::test_support::{fixture, ns};

fn arch_payload(slug: &str, children: &[&str]) -> MemoryPayload {
    MemoryPayload {
        slug: slug.to_owned(),
        title: format!("Arch {slug}"),
        ai_requirements: Some(format!("Requirements for {slug}. More detail here.")),
        ai_when_to_use: Some(vec![format!("when building {slug}")]),
        children_slugs: Some(children.iter().map(|s| (*s).to_owned()).collect()),
        related_slugs: None,
        linked_epic_ids: None,
        ai_solutions: None,
        ai_use_case: None,
        keywords: Some(vec![slug.to_owned()]),
        tags: None,
    }
}

fn trouble_payload(slug: &str, use_case: &str) -> MemoryPayload {
    MemoryPayload {
        slug: slug.to_owned(),
        title: format!("Fix {slug}"),
        ai_requirements: None,
        ai_when_to_use: None,
        children_slugs: None,
        related_slugs: None,
        linked_epic_ids: None,
        ai_solutions: Some(format!("Solution steps for {slug}.")),
        ai_use_case: Some(vec![use_case.to_owned()]),
        keywords: None,
        tags: None,
    }
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("auth", &[]))
        .await
        .expect("create");
    let err = f
        .memory
        .create(&demo, MemoryKind::Architecture, arch_payload("auth", &[]))
        .await
        .expect_err("duplicate must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn kind_mismatched_fields_are_rejected() {
    let f = fixture();
    let demo = ns("demo");
    let mut payload = arch_payload("auth", &[]);
    payload.ai_solutions = Some("not valid here".to_owned());
    let err = f
        .memory
        .create(&demo, MemoryKind::Architecture, payload)
        .await
        .expect_err("troubleshoot field on architecture must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn dangling_links_flagged_on_read_but_accepted_on_write() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("root", &["future"]))
        .await
        .expect("forward reference accepted");
    let read = f
        .memory
        .read(&demo, MemoryKind::Architecture, "root")
        .await
        .expect("read");
    assert_eq!(read.dangling, vec!["future".to_owned()]);

    // Once the target exists, the flag clears.
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("future", &[]))
        .await
        .expect("create target");
    let read = f
        .memory
        .read(&demo, MemoryKind::Architecture, "root")
        .await
        .expect("read again");
    assert!(read.dangling.is_empty());
}

#[tokio::test]
async fn children_cycles_are_rejected() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("a", &["b"]))
        .await
        .expect("a");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("b", &[]))
        .await
        .expect("b");

    let err = f
        .memory
        .update(
            &demo,
            MemoryKind::Architecture,
            MemoryUpdate {
                slug: "b".to_owned(),
                children_slugs: Some(vec!["a".to_owned()]),
                title: None,
                ai_requirements: None,
                ai_when_to_use: None,
                related_slugs: None,
                linked_epic_ids: None,
                ai_solutions: None,
                ai_use_case: None,
                keywords: None,
                tags: None,
            },
        )
        .await
        .expect_err("closing the loop must fail");
    assert_eq!(err.code(), "ErrCycle");
}

#[tokio::test]
async fn record_use_updates_counters() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Troubleshoot, trouble_payload("cors", "CORS preflight failed"))
        .await
        .expect("create");

    f.memory
        .record_use(&demo, "cors", UseOutcome::Success)
        .await
        .expect("success");
    let read = f
        .memory
        .record_use(&demo, "cors", UseOutcome::Fail)
        .await
        .expect("fail");
    assert_eq!(read.item["usage_count"], 2);
    assert_eq!(read.item["success_count"], 1);
}

#[tokio::test]
async fn matcher_prefers_proven_solutions() {
    let f = fixture();
    let demo = ns("demo");
    for slug in ["q1", "q2", "q3"] {
        f.memory
            .create(
                &demo,
                MemoryKind::Troubleshoot,
                trouble_payload(slug, "CORS preflight failed with an error"),
            )
            .await
            .expect("create");
    }
    for _ in 0..5 {
        f.memory
            .record_use(&demo, "q1", UseOutcome::Success)
            .await
            .expect("record");
    }
    f.memory
        .record_use(&demo, "q2", UseOutcome::Success)
        .await
        .expect("record");

    let matches = f
        .memory
        .match_problem(&demo, "CORS preflight 401 response", 3)
        .await
        .expect("match");
    let slugs: Vec<&str> = matches.iter().map(|m| m.slug.as_str()).collect();
    assert_eq!(slugs, ["q1", "q2", "q3"], "usage statistics break near-ties");
    assert!(matches[0].success_rate > 0.99);
}

#[tokio::test]
async fn smart_context_walks_children() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("root", &["leaf"]))
        .await
        .expect("root");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("leaf", &[]))
        .await
        .expect("leaf");

    let context = f
        .memory
        .get_context(&demo, "root", 4000, 2, None)
        .await
        .expect("context");
    assert!(context.context.contains("Arch root"));
    assert!(context.context.contains("Arch leaf"));
    assert!(!context.truncated);
    assert_eq!(context.visited_slugs, vec!["root".to_owned(), "leaf".to_owned()]);
}

#[tokio::test]
async fn smart_context_expired_deadline_yields_partial() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("root", &["leaf"]))
        .await
        .expect("root");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("leaf", &[]))
        .await
        .expect("leaf");

    let past = std::time::Instant::now() - std::time::Duration::from_millis(1);
    let context = f
        .memory
        .get_context(&demo, "root", 4000, 2, Some(past))
        .await
        .expect("partial context, not a timeout error");
    assert!(context.truncated);
    assert!(context.context.contains("Arch root"), "start item survives");
    assert!(!context.context.contains("Arch leaf"));
}

#[tokio::test]
async fn memory_export_import_round_trips() {
    let f = fixture();
    let demo = ns("demo");
    let dst = ns("dst");
    f.memory
        .create(&demo, MemoryKind::Troubleshoot, trouble_payload("cors", "CORS preflight failed"))
        .await
        .expect("create");
    f.memory
        .record_use(&demo, "cors", UseOutcome::Success)
        .await
        .expect("record");

    let documents = f
        .memory
        .export(&demo, MemoryKind::Troubleshoot, None)
        .await
        .expect("export");
    assert_eq!(documents.len(), 1);

    let report = f
        .memory
        .import(
            &dst,
            MemoryKind::Troubleshoot,
            documents.iter().map(|d| d.content.clone()).collect(),
            ImportMode::Replace,
        )
        .await
        .expect("import");
    assert_eq!(report.created, 1);
    assert!(report.errors.is_empty());

    let read = f
        .memory
        .read(&dst, MemoryKind::Troubleshoot, "cors")
        .await
        .expect("read");
    assert_eq!(read.item["usage_count"], 1);
    assert_eq!(read.item["success_count"], 1);
    assert_eq!(read.item["namespace"], "dst");
}

#[tokio::test]
async fn list_returns_newest_first() {
    let f = fixture();
    let demo = ns("demo");
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("older", &[]))
        .await
        .expect("older");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    f.memory
        .create(&demo, MemoryKind::Architecture, arch_payload("newer", &[]))
        .await
        .expect("newer");

    let listed = f
        .memory
        .list(&demo, MemoryKind::Architecture, 10)
        .await
        .expect("list");
    assert_eq!(listed[0]["slug"], "newer");
    assert_eq!(listed[1]["slug"], "older");
}
