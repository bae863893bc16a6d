//! Namespace sync tests: export/import round trip, backup/restore.

use mcw_domain::entities::{WorkItemStatus, WorkItemType};
use mcw_domain::ops::{ImportMode, SyncAction, SyncDataArgs, SyncResult};
use mcw_domain::ports::{SyncServiceInterface, WorkItemServiceInterface};

use crate::test_support::{create, fetch, fixture, ns, set_status};

#[tokio::test]
async fn export_import_replace_round_trips() {
    let f = fixture();
    let src = ns("src");
    let dst = ns("dst");

    // A small forest with varied parents and statuses.
    let initiative = create(&f.work_items, &src, WorkItemType::Initiative, "Build", None).await;
    let epic = create(&f.work_items, &src, WorkItemType::Epic, "Backend", Some(initiative.id)).await;
    let story = create(&f.work_items, &src, WorkItemType::Story, "CRUD", Some(epic.id)).await;
    let mut leaf_ids = Vec::new();
    for n in 0..3 {
        leaf_ids.push(
            create(&f.work_items, &src, WorkItemType::Task, &format!("T{n}"), Some(story.id))
                .await
                .id,
        );
    }
    let loose = create(&f.work_items, &src, WorkItemType::Task, "Loose end", None).await;
    set_status(&f.work_items, &src, leaf_ids[0], WorkItemStatus::Completed).await;
    set_status(&f.work_items, &src, loose.id, WorkItemStatus::InProgress).await;

    let exported = match f
        .sync
        .sync(&src, SyncDataArgs { action: SyncAction::Export { filters: None } })
        .await
        .expect("export")
    {
        SyncResult::Export { documents } => documents,
        other => panic!("expected export result, got {other:?}"),
    };
    assert_eq!(exported.len(), 6);

    let report = match f
        .sync
        .sync(
            &dst,
            SyncDataArgs {
                action: SyncAction::Import {
                    documents: exported.iter().map(|d| d.content.clone()).collect(),
                    mode: ImportMode::Replace,
                },
            },
        )
        .await
        .expect("import")
    {
        SyncResult::Import(report) => report,
        other => panic!("expected import result, got {other:?}"),
    };
    assert_eq!(report.created, 6);
    assert!(report.errors.is_empty());

    // Non-derived fields match; derived values recompute identically.
    for source_id in [initiative.id, epic.id, story.id, leaf_ids[0], loose.id] {
        let src_item = fetch(&f.work_items, &src, source_id).await;
        let dst_item = fetch(&f.work_items, &dst, source_id).await;
        for key in ["title", "type", "status", "parent_id", "order_index", "sequence_number", "progress"] {
            assert_eq!(src_item.get(key), dst_item.get(key), "field {key} differs");
        }
        assert_eq!(dst_item["namespace"], "dst");
    }
}

#[tokio::test]
async fn import_create_only_reports_conflicts() {
    let f = fixture();
    let src = ns("src");

    create(&f.work_items, &src, WorkItemType::Task, "Once", None).await;
    let exported = match f
        .sync
        .sync(&src, SyncDataArgs { action: SyncAction::Export { filters: None } })
        .await
        .expect("export")
    {
        SyncResult::Export { documents } => documents,
        other => panic!("expected export, got {other:?}"),
    };

    // Importing into the same namespace under create_only conflicts.
    let report = match f
        .sync
        .sync(
            &src,
            SyncDataArgs {
                action: SyncAction::Import {
                    documents: exported.iter().map(|d| d.content.clone()).collect(),
                    mode: ImportMode::CreateOnly,
                },
            },
        )
        .await
        .expect("import")
    {
        SyncResult::Import(report) => report,
        other => panic!("expected import, got {other:?}"),
    };
    assert_eq!(report.created, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "ErrValidation");
}

#[tokio::test]
async fn import_garbage_reports_per_record_errors() {
    let f = fixture();
    let dst = ns("dst");
    let report = match f
        .sync
        .sync(
            &dst,
            SyncDataArgs {
                action: SyncAction::Import {
                    documents: vec!["not a document".to_owned()],
                    mode: ImportMode::CreateOrUpdate,
                },
            },
        )
        .await
        .expect("import")
    {
        SyncResult::Import(report) => report,
        other => panic!("expected import, got {other:?}"),
    };
    assert_eq!(report.created, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].index, 0);
}

#[tokio::test]
async fn backup_and_restore_through_the_service() {
    let f = fixture();
    let demo = ns("demo");
    let keeper = create(&f.work_items, &demo, WorkItemType::Task, "keep me", None).await;

    let descriptor = match f
        .sync
        .sync(&demo, SyncDataArgs { action: SyncAction::Backup })
        .await
        .expect("backup")
    {
        SyncResult::Backup(descriptor) => descriptor,
        other => panic!("expected backup, got {other:?}"),
    };
    assert_eq!(descriptor.manifest.counts["work_items"], 1);

    // Destroy, then restore.
    create(&f.work_items, &demo, WorkItemType::Task, "extra", None).await;
    let restored = match f
        .sync
        .sync(
            &demo,
            SyncDataArgs {
                action: SyncAction::Restore {
                    archive: descriptor.archive.clone(),
                },
            },
        )
        .await
        .expect("restore")
    {
        SyncResult::Restore(report) => report,
        other => panic!("expected restore, got {other:?}"),
    };
    assert_eq!(restored.counts["work_items"], 1);

    let item = fetch(&f.work_items, &demo, keeper.id).await;
    assert_eq!(item["title"], "keep me");

    let listed = f.sync.list_backups().await.expect("list");
    assert_eq!(listed.len(), 1);
}
