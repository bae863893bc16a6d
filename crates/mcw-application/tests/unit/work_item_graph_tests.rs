//! Graph engine tests: propagation, hierarchy validation, ordering.

use mcw_domain::entities::{WorkItemStatus, WorkItemType};
use mcw_domain::events::DomainEvent;
use mcw_domain::ops::{
    DeleteWorkItem, GetHierarchyArgs, HierarchyRelationship, ManageWorkItemArgs,
    ManageWorkItemResult, ProgressData, ReorderWorkItemsArgs, TrackAction, TrackProgressArgs,
    TrackProgressResult, UpdateWorkItem,
};
use mcw_domain::ports::WorkItemServiceInterface;

use crate::test_support::{create, create_args, fetch, fixture, ns, set_status};

fn update_parent(
    id: mcw_domain::value_objects::WorkItemId,
    parent: Option<mcw_domain::value_objects::WorkItemId>,
) -> UpdateWorkItem {
    UpdateWorkItem {
        work_item_id: id,
        title: None,
        description: None,
        status: None,
        priority: None,
        complexity: None,
        parent_id: Some(parent),
        acceptance_criteria: None,
        context_tags: None,
        notes: None,
    }
}

#[tokio::test]
async fn progress_propagates_leaf_to_root() {
    let f = fixture();
    let demo = ns("demo");
    let initiative = create(&f.work_items, &demo, WorkItemType::Initiative, "Build X", None).await;
    let epic = create(
        &f.work_items,
        &demo,
        WorkItemType::Epic,
        "Backend",
        Some(initiative.id),
    )
    .await;
    let story = create(&f.work_items, &demo, WorkItemType::Story, "CRUD", Some(epic.id)).await;
    let mut tasks = Vec::new();
    for n in 1..=3 {
        tasks.push(
            create(
                &f.work_items,
                &demo,
                WorkItemType::Task,
                &format!("T{n}"),
                Some(story.id),
            )
            .await,
        );
    }

    set_status(&f.work_items, &demo, tasks[0].id, WorkItemStatus::Completed).await;

    let story_v = fetch(&f.work_items, &demo, story.id).await;
    assert!((story_v["progress"].as_f64().expect("progress") - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(story_v["status"], "in_progress");
    // Single-child chains average straight through (progress of a parent is
    // the mean over its included children).
    let epic_v = fetch(&f.work_items, &demo, epic.id).await;
    assert!((epic_v["progress"].as_f64().expect("progress") - 1.0 / 3.0).abs() < 1e-9);
    let initiative_v = fetch(&f.work_items, &demo, initiative.id).await;
    assert!((initiative_v["progress"].as_f64().expect("progress") - 1.0 / 3.0).abs() < 1e-9);

    set_status(&f.work_items, &demo, tasks[1].id, WorkItemStatus::Completed).await;
    set_status(&f.work_items, &demo, tasks[2].id, WorkItemStatus::Completed).await;

    for id in [story.id, epic.id, initiative.id] {
        let item = fetch(&f.work_items, &demo, id).await;
        assert_eq!(item["status"], "completed");
        assert!((item["progress"].as_f64().expect("progress") - 1.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn blocked_leaf_contributes_quarter_and_blocks_ancestors() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let t1 = create(&f.work_items, &demo, WorkItemType::Task, "T1", Some(story.id)).await;
    let _t2 = create(&f.work_items, &demo, WorkItemType::Task, "T2", Some(story.id)).await;

    set_status(&f.work_items, &demo, t1.id, WorkItemStatus::Blocked).await;

    let story_v = fetch(&f.work_items, &demo, story.id).await;
    assert_eq!(story_v["status"], "blocked");
    assert!((story_v["progress"].as_f64().expect("progress") - 0.125).abs() < 1e-9);
}

#[tokio::test]
async fn cancelled_children_are_excluded_from_averaging() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let t1 = create(&f.work_items, &demo, WorkItemType::Task, "T1", Some(story.id)).await;
    let t2 = create(&f.work_items, &demo, WorkItemType::Task, "T2", Some(story.id)).await;

    set_status(&f.work_items, &demo, t1.id, WorkItemStatus::Completed).await;
    set_status(&f.work_items, &demo, t2.id, WorkItemStatus::Cancelled).await;

    let story_v = fetch(&f.work_items, &demo, story.id).await;
    // Only the completed task is included; the parent completes.
    assert_eq!(story_v["status"], "completed");
    assert!((story_v["progress"].as_f64().expect("progress") - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn hierarchy_rules_enforced_on_create() {
    let f = fixture();
    let demo = ns("demo");
    let epic = create(&f.work_items, &demo, WorkItemType::Epic, "E", None).await;

    // epic -> story is allowed.
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", Some(epic.id)).await;
    assert_eq!(story.parent_id, Some(epic.id));

    // epic -> initiative is not.
    let err = f
        .work_items
        .manage(
            &demo,
            ManageWorkItemArgs::Create(create_args(
                WorkItemType::Initiative,
                "bad",
                Some(epic.id),
            )),
        )
        .await
        .expect_err("initiative under epic must fail");
    assert_eq!(err.code(), "ErrHierarchy");
}

#[tokio::test]
async fn non_leaf_status_updates_are_derived_errors() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let _task = create(&f.work_items, &demo, WorkItemType::Task, "T", Some(story.id)).await;

    let err = f
        .work_items
        .manage(
            &demo,
            ManageWorkItemArgs::Update(UpdateWorkItem {
                work_item_id: story.id,
                status: Some(WorkItemStatus::Completed),
                title: None,
                description: None,
                priority: None,
                complexity: None,
                parent_id: None,
                acceptance_criteria: None,
                context_tags: None,
                notes: None,
            }),
        )
        .await
        .expect_err("non-leaf completed must fail");
    assert_eq!(err.code(), "ErrDerived");

    // Manual cancel is the one allowed override, and it sticks.
    set_status(&f.work_items, &demo, story.id, WorkItemStatus::Cancelled).await;
    let story_v = fetch(&f.work_items, &demo, story.id).await;
    assert_eq!(story_v["status"], "cancelled");
    assert_eq!(story_v["status_override"], true);
}

#[tokio::test]
async fn reorder_rewrites_sequences() {
    let f = fixture();
    let demo = ns("demo");
    let _first_root = create(&f.work_items, &demo, WorkItemType::Epic, "other", None).await;
    let parent = create(&f.work_items, &demo, WorkItemType::Epic, "P", None).await;
    let a = create(&f.work_items, &demo, WorkItemType::Story, "A", Some(parent.id)).await;
    let b = create(&f.work_items, &demo, WorkItemType::Story, "B", Some(parent.id)).await;
    let c = create(&f.work_items, &demo, WorkItemType::Story, "C", Some(parent.id)).await;
    assert_eq!(a.sequence_number.as_deref(), Some("2.1"));
    assert_eq!(c.sequence_number.as_deref(), Some("2.3"));

    let result = f
        .work_items
        .reorder(
            &demo,
            ReorderWorkItemsArgs {
                parent_id: Some(parent.id),
                work_item_ids: vec![c.id, a.id, b.id],
            },
        )
        .await
        .expect("reorder");
    let sequences: Vec<&str> = result
        .items
        .iter()
        .map(|item| item.sequence_number.as_str())
        .collect();
    assert_eq!(sequences, ["2.1", "2.2", "2.3"]);
    assert_eq!(result.items[0].id, c.id);

    // Unrelated items keep their sequence.
    let other = fetch(&f.work_items, &demo, _first_root.id).await;
    assert_eq!(other["sequence_number"], "1");
}

#[tokio::test]
async fn reorder_set_mismatch_leaves_state_unchanged() {
    let f = fixture();
    let demo = ns("demo");
    let parent = create(&f.work_items, &demo, WorkItemType::Epic, "P", None).await;
    let a = create(&f.work_items, &demo, WorkItemType::Story, "A", Some(parent.id)).await;
    let b = create(&f.work_items, &demo, WorkItemType::Story, "B", Some(parent.id)).await;
    let stranger = create(&f.work_items, &demo, WorkItemType::Story, "X", None).await;

    let err = f
        .work_items
        .reorder(
            &demo,
            ReorderWorkItemsArgs {
                parent_id: Some(parent.id),
                work_item_ids: vec![b.id, stranger.id],
            },
        )
        .await
        .expect_err("foreign id must fail");
    assert_eq!(err.code(), "ErrOrderSet");

    let a_v = fetch(&f.work_items, &demo, a.id).await;
    assert_eq!(a_v["order_index"], 0);
}

#[tokio::test]
async fn reorder_with_current_order_is_noop_and_reversible() {
    let f = fixture();
    let demo = ns("demo");
    let parent = create(&f.work_items, &demo, WorkItemType::Epic, "P", None).await;
    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(
            create(&f.work_items, &demo, WorkItemType::Story, &format!("S{n}"), Some(parent.id))
                .await
                .id,
        );
    }

    let noop = f
        .work_items
        .reorder(
            &demo,
            ReorderWorkItemsArgs {
                parent_id: Some(parent.id),
                work_item_ids: ids.clone(),
            },
        )
        .await
        .expect("noop reorder");
    assert_eq!(noop.items.len(), 4);

    let reversed: Vec<_> = ids.iter().rev().copied().collect();
    f.work_items
        .reorder(
            &demo,
            ReorderWorkItemsArgs {
                parent_id: Some(parent.id),
                work_item_ids: reversed,
            },
        )
        .await
        .expect("reverse");
    f.work_items
        .reorder(
            &demo,
            ReorderWorkItemsArgs {
                parent_id: Some(parent.id),
                work_item_ids: ids.clone(),
            },
        )
        .await
        .expect("restore");

    for (position, id) in ids.iter().enumerate() {
        let item = fetch(&f.work_items, &demo, *id).await;
        assert_eq!(item["order_index"], position as u64);
    }
}

#[tokio::test]
async fn cascade_delete_removes_subtree_and_is_idempotent() {
    let f = fixture();
    let demo = ns("demo");
    let epic = create(&f.work_items, &demo, WorkItemType::Epic, "E", None).await;
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", Some(epic.id)).await;
    let _task = create(&f.work_items, &demo, WorkItemType::Task, "T", Some(story.id)).await;

    let result = f
        .work_items
        .manage(
            &demo,
            ManageWorkItemArgs::Delete(DeleteWorkItem {
                work_item_id: story.id,
                delete_children: true,
            }),
        )
        .await
        .expect("delete");
    match result {
        ManageWorkItemResult::Deleted { deleted_ids } => assert_eq!(deleted_ids.len(), 2),
        ManageWorkItemResult::Item(_) => panic!("expected deletion result"),
    }

    // Second delete of an absent id succeeds with an empty set.
    let again = f
        .work_items
        .manage(
            &demo,
            ManageWorkItemArgs::Delete(DeleteWorkItem {
                work_item_id: story.id,
                delete_children: true,
            }),
        )
        .await
        .expect("idempotent delete");
    match again {
        ManageWorkItemResult::Deleted { deleted_ids } => assert!(deleted_ids.is_empty()),
        ManageWorkItemResult::Item(_) => panic!("expected deletion result"),
    }
}

#[tokio::test]
async fn orphaning_delete_moves_children_to_root() {
    let f = fixture();
    let demo = ns("demo");
    let _root = create(&f.work_items, &demo, WorkItemType::Epic, "existing root", None).await;
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let t1 = create(&f.work_items, &demo, WorkItemType::Task, "T1", Some(story.id)).await;
    let t2 = create(&f.work_items, &demo, WorkItemType::Task, "T2", Some(story.id)).await;

    f.work_items
        .manage(
            &demo,
            ManageWorkItemArgs::Delete(DeleteWorkItem {
                work_item_id: story.id,
                delete_children: false,
            }),
        )
        .await
        .expect("delete");

    let t1_v = fetch(&f.work_items, &demo, t1.id).await;
    let t2_v = fetch(&f.work_items, &demo, t2.id).await;
    assert!(t1_v.get("parent_id").is_none(), "orphan is a root now");
    // Appended after the surviving root, keeping relative order.
    assert_eq!(t1_v["order_index"], 1);
    assert_eq!(t2_v["order_index"], 2);
}

#[tokio::test]
async fn reparent_cycle_is_rejected() {
    let f = fixture();
    let demo = ns("demo");
    let epic = create(&f.work_items, &demo, WorkItemType::Epic, "E", None).await;
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", Some(epic.id)).await;

    // A task under the story, then try to move the story under the task's
    // subtree... the story under itself is the minimal cycle.
    let err = f
        .work_items
        .manage(&demo, ManageWorkItemArgs::Update(update_parent(story.id, Some(story.id))))
        .await
        .expect_err("self-parenting must fail");
    assert_eq!(err.code(), "ErrCycle");
}

#[tokio::test]
async fn description_length_boundary() {
    let f = fixture();
    let demo = ns("demo");

    let mut args = create_args(WorkItemType::Task, "boundary", None);
    args.description = "x".repeat(10_000);
    assert!(
        f.work_items
            .manage(&demo, ManageWorkItemArgs::Create(args))
            .await
            .is_ok(),
        "exactly 10 000 characters is accepted"
    );

    let mut args = create_args(WorkItemType::Task, "over", None);
    args.description = "x".repeat(10_001);
    let err = f
        .work_items
        .manage(&demo, ManageWorkItemArgs::Create(args))
        .await
        .expect_err("10 001 characters must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn track_progress_percent_overrides_leaf_derivation() {
    let f = fixture();
    let demo = ns("demo");
    let task = create(&f.work_items, &demo, WorkItemType::Task, "T", None).await;

    let result = f
        .work_items
        .track(
            &demo,
            TrackProgressArgs {
                action: TrackAction::Track,
                work_item_id: Some(task.id),
                progress_data: Some(ProgressData {
                    percent: Some(40.0),
                    status: Some(WorkItemStatus::InProgress),
                    notes: Some("almost halfway".to_owned()),
                    blockers: vec![],
                }),
            },
        )
        .await
        .expect("track");
    match result {
        TrackProgressResult::Item(item) => {
            assert_eq!(item.status, WorkItemStatus::InProgress);
            assert!((item.progress - 0.4).abs() < 1e-9);
            assert!(item.notes.contains("almost halfway"));
        }
        TrackProgressResult::Analytics(_) => panic!("expected item"),
    }
}

#[tokio::test]
async fn analytics_summarize_namespace() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let t1 = create(&f.work_items, &demo, WorkItemType::Task, "T1", Some(story.id)).await;
    let _t2 = create(&f.work_items, &demo, WorkItemType::Task, "T2", Some(story.id)).await;
    set_status(&f.work_items, &demo, t1.id, WorkItemStatus::Blocked).await;

    let result = f
        .work_items
        .track(
            &demo,
            TrackProgressArgs {
                action: TrackAction::GetAnalytics,
                work_item_id: None,
                progress_data: None,
            },
        )
        .await
        .expect("analytics");
    match result {
        TrackProgressResult::Analytics(blob) => {
            assert_eq!(blob.total, 3);
            assert_eq!(blob.by_type["task"], 2);
            assert_eq!(blob.blocked.len(), 2, "the blocked task and its story");
            assert_eq!(blob.completion_rate, 0.0);
        }
        TrackProgressResult::Item(_) => panic!("expected analytics"),
    }
}

#[tokio::test]
async fn hierarchy_traversals() {
    let f = fixture();
    let demo = ns("demo");
    let initiative = create(&f.work_items, &demo, WorkItemType::Initiative, "I", None).await;
    let epic = create(&f.work_items, &demo, WorkItemType::Epic, "E", Some(initiative.id)).await;
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", Some(epic.id)).await;
    let _task = create(&f.work_items, &demo, WorkItemType::Task, "T", Some(story.id)).await;

    let children = f
        .work_items
        .hierarchy(
            &demo,
            GetHierarchyArgs {
                work_item_id: Some(initiative.id),
                relationship: HierarchyRelationship::Children,
                max_depth: None,
                include_completed: true,
                include_cancelled: false,
            },
        )
        .await
        .expect("children");
    assert_eq!(children.nodes.len(), 1);
    assert!(children.nodes[0].children.is_empty());

    let descendants = f
        .work_items
        .hierarchy(
            &demo,
            GetHierarchyArgs {
                work_item_id: Some(initiative.id),
                relationship: HierarchyRelationship::Descendants,
                max_depth: Some(2),
                include_completed: true,
                include_cancelled: false,
            },
        )
        .await
        .expect("descendants");
    assert_eq!(descendants.nodes.len(), 1);
    assert_eq!(descendants.nodes[0].children.len(), 1, "depth 2 reaches the story");
    assert!(descendants.nodes[0].children[0].children.is_empty());

    let ancestors = f
        .work_items
        .hierarchy(
            &demo,
            GetHierarchyArgs {
                work_item_id: Some(story.id),
                relationship: HierarchyRelationship::Ancestors,
                max_depth: None,
                include_completed: true,
                include_cancelled: false,
            },
        )
        .await
        .expect("ancestors");
    let titles: Vec<&str> = ancestors
        .nodes
        .iter()
        .map(|node| node.item.title.as_str())
        .collect();
    assert_eq!(titles, ["E", "I"], "nearest ancestor first");

    let err = f
        .work_items
        .hierarchy(
            &demo,
            GetHierarchyArgs {
                work_item_id: Some(story.id),
                relationship: HierarchyRelationship::Descendants,
                max_depth: Some(0),
                include_completed: true,
                include_cancelled: false,
            },
        )
        .await
        .expect_err("max_depth 0 must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn events_published_for_mutations() {
    let f = fixture();
    let demo = ns("demo");
    let story = create(&f.work_items, &demo, WorkItemType::Story, "S", None).await;
    let task = create(&f.work_items, &demo, WorkItemType::Task, "T", Some(story.id)).await;
    set_status(&f.work_items, &demo, task.id, WorkItemStatus::Completed).await;

    let events = f.bus.published();
    assert!(!events.is_empty());
    let last = events.last().expect("at least one event");
    match last {
        DomainEvent::WorkItemsChanged { namespace, changed_ids, .. } => {
            assert_eq!(namespace.as_str(), "demo");
            assert!(changed_ids.contains(&task.id));
            assert!(changed_ids.contains(&story.id), "propagated ancestor included");
        }
        DomainEvent::WorkItemsDeleted { .. } => panic!("expected change event"),
    }
}
