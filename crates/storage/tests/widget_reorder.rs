#![forbid(unsafe_code)]

use cw_core::ids::{GroupId, WidgetId};
use cw_core::model::{ContextWidget, ViewTarget, Visibility, widget_types};
use cw_core::tree::{ParentTarget, Placement};
use cw_storage::{
    CreateWidgetRequest, PositionHint, ReorderWidgetRequest, SqliteStore, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("cw_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn group() -> GroupId {
    GroupId::try_new(7).expect("group id")
}

fn create(
    store: &mut SqliteStore,
    title: &str,
    parent: ParentTarget,
    placement: Option<Placement>,
) -> ContextWidget {
    store
        .create(CreateWidgetRequest {
            group_id: group(),
            widget_type: None,
            title: Some(title.to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            position: Some(PositionHint { parent, placement }),
        })
        .expect("create widget")
}

fn create_unordered(store: &mut SqliteStore, title: &str) -> ContextWidget {
    store
        .create(CreateWidgetRequest {
            group_id: group(),
            widget_type: None,
            title: Some(title.to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            position: None,
        })
        .expect("create unordered widget")
}

fn at_root(store: &mut SqliteStore, title: &str) -> ContextWidget {
    create(store, title, ParentTarget::Root, Some(Placement::AddToEnd))
}

/// `(title, order)` of the ordered children of `parent`, in menu order.
fn children(store: &SqliteStore, parent: Option<WidgetId>) -> Vec<(String, u32)> {
    let mut rows = store
        .widgets_for_group(group())
        .expect("widgets for group")
        .into_iter()
        .filter(|widget| widget.parent_id == parent)
        .filter_map(|widget| Some((widget.title?, widget.order?)))
        .collect::<Vec<_>>();
    rows.sort_by_key(|(_, order)| *order);
    rows
}

fn named(rows: &[(&str, u32)]) -> Vec<(String, u32)> {
    rows.iter()
        .map(|(title, order)| (title.to_string(), *order))
        .collect()
}

#[test]
fn insert_before_shifts_later_siblings() {
    let mut store = SqliteStore::open(temp_dir("insert_before_shifts_later_siblings"))
        .expect("open store");
    at_root(&mut store, "A");
    let b = at_root(&mut store, "B");
    at_root(&mut store, "C");
    let d = create_unordered(&mut store, "D");

    let moved = store
        .reorder(ReorderWidgetRequest {
            id: d.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::InFrontOf(b.id)),
        })
        .expect("reorder");

    assert_eq!(moved.order, Some(2));
    assert!(moved.auto_added);
    assert_eq!(
        children(&store, None),
        named(&[("A", 1), ("D", 2), ("B", 3), ("C", 4)])
    );
    assert!(store.check_menu(group()).expect("check menu").is_none());
}

#[test]
fn empty_position_hint_leaves_new_widget_unordered() {
    let mut store = SqliteStore::open(temp_dir("empty_position_hint_leaves_new_widget_unordered"))
        .expect("open store");
    at_root(&mut store, "A");

    let loose = create(&mut store, "B", ParentTarget::Unchanged, None);

    assert_eq!(loose.parent_id, None);
    assert_eq!(loose.order, None);
    assert_eq!(children(&store, None), named(&[("A", 1)]));
}

#[test]
fn add_to_end_appends() {
    let mut store = SqliteStore::open(temp_dir("add_to_end_appends")).expect("open store");
    at_root(&mut store, "A");
    at_root(&mut store, "B");
    let c = create_unordered(&mut store, "C");

    store
        .reorder(ReorderWidgetRequest {
            id: c.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::AddToEnd),
        })
        .expect("reorder");

    assert_eq!(children(&store, None), named(&[("A", 1), ("B", 2), ("C", 3)]));
}

#[test]
fn cross_parent_move_renumbers_both_groups() {
    let mut store = SqliteStore::open(temp_dir("cross_parent_move_renumbers_both_groups"))
        .expect("open store");
    let p1 = at_root(&mut store, "P1");
    let p2 = at_root(&mut store, "P2");
    let a = create(&mut store, "A", ParentTarget::Under(p1.id), None);
    create(&mut store, "B", ParentTarget::Under(p1.id), None);
    create(&mut store, "C", ParentTarget::Under(p2.id), None);

    let moved = store
        .reorder(ReorderWidgetRequest {
            id: a.id,
            parent: ParentTarget::Under(p2.id),
            placement: Some(Placement::AddToEnd),
        })
        .expect("reorder");

    assert_eq!(moved.parent_id, Some(p2.id));
    assert_eq!(children(&store, Some(p1.id)), named(&[("B", 1)]));
    assert_eq!(children(&store, Some(p2.id)), named(&[("C", 1), ("A", 2)]));
    assert_eq!(children(&store, None), named(&[("P1", 1), ("P2", 2)]));
}

#[test]
fn move_within_group_keeps_it_dense() {
    let mut store =
        SqliteStore::open(temp_dir("move_within_group_keeps_it_dense")).expect("open store");
    let a = at_root(&mut store, "A");
    at_root(&mut store, "B");
    at_root(&mut store, "C");
    let d = at_root(&mut store, "D");

    store
        .reorder(ReorderWidgetRequest {
            id: d.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::InFrontOf(a.id)),
        })
        .expect("move to front");
    assert_eq!(
        children(&store, None),
        named(&[("D", 1), ("A", 2), ("B", 3), ("C", 4)])
    );

    store
        .reorder(ReorderWidgetRequest {
            id: d.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::AddToEnd),
        })
        .expect("move back to end");
    assert_eq!(
        children(&store, None),
        named(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)])
    );
}

#[test]
fn in_front_of_moves_into_reference_group() {
    let mut store = SqliteStore::open(temp_dir("in_front_of_moves_into_reference_group"))
        .expect("open store");
    let parent = at_root(&mut store, "P");
    let child = create(&mut store, "X", ParentTarget::Under(parent.id), None);
    create(&mut store, "Y", ParentTarget::Under(parent.id), None);

    let moved = store
        .reorder(ReorderWidgetRequest {
            id: child.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::InFrontOf(parent.id)),
        })
        .expect("move child to parent level");

    assert_eq!(moved.parent_id, None);
    assert_eq!(children(&store, None), named(&[("X", 1), ("P", 2)]));
    assert_eq!(children(&store, Some(parent.id)), named(&[("Y", 1)]));
}

#[test]
fn unknown_widget_is_not_found() {
    let mut store = SqliteStore::open(temp_dir("unknown_widget_is_not_found")).expect("open store");
    at_root(&mut store, "A");
    let missing = WidgetId::try_new(9_999).expect("widget id");

    let err = store
        .reorder(ReorderWidgetRequest {
            id: missing,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::AddToEnd),
        })
        .expect_err("expected unknown widget to fail");
    match err {
        StoreError::NotFound { id } => assert_eq!(id, missing),
        other => panic!("expected NotFound error, got {other:?}"),
    }
}

#[test]
fn invalid_in_front_of_is_rejected_without_writes() {
    let mut store = SqliteStore::open(temp_dir("invalid_in_front_of_is_rejected_without_writes"))
        .expect("open store");
    let a = at_root(&mut store, "A");
    at_root(&mut store, "B");
    let loose = create_unordered(&mut store, "loose");
    let before = store.widgets_for_group(group()).expect("widgets");

    let cases = [
        Placement::InFrontOf(loose.id),
        Placement::InFrontOf(a.id),
        Placement::InFrontOf(WidgetId::try_new(4_242).expect("widget id")),
    ];
    for placement in cases {
        let err = store
            .reorder(ReorderWidgetRequest {
                id: a.id,
                parent: ParentTarget::Unchanged,
                placement: Some(placement),
            })
            .expect_err("expected invalid reference to fail");
        assert!(
            matches!(err, StoreError::Validation(_)),
            "expected Validation error for {placement:?}, got {err:?}"
        );
    }

    let err = store
        .reorder(ReorderWidgetRequest {
            id: loose.id,
            parent: ParentTarget::Under(a.id),
            placement: Some(Placement::InFrontOf(a.id)),
        })
        .expect_err("expected conflicting parent to fail");
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");

    assert_eq!(store.widgets_for_group(group()).expect("widgets"), before);
}

#[test]
fn parent_cycles_are_rejected() {
    let mut store = SqliteStore::open(temp_dir("parent_cycles_are_rejected")).expect("open store");
    let top = at_root(&mut store, "top");
    let middle = create(&mut store, "middle", ParentTarget::Under(top.id), None);
    let leaf = create(&mut store, "leaf", ParentTarget::Under(middle.id), None);

    for parent in [leaf.id, middle.id, top.id] {
        let err = store
            .reorder(ReorderWidgetRequest {
                id: top.id,
                parent: ParentTarget::Under(parent),
                placement: None,
            })
            .expect_err("expected cycle to fail");
        assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
    }
    assert_eq!(children(&store, Some(top.id)), named(&[("middle", 1)]));
}

#[test]
fn typed_containers_reject_foreign_children() {
    let mut store = SqliteStore::open(temp_dir("typed_containers_reject_foreign_children"))
        .expect("open store");
    let chats = store
        .create(CreateWidgetRequest {
            group_id: group(),
            widget_type: Some(widget_types::CHATS.to_string()),
            title: Some("chats".to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            position: Some(PositionHint {
                parent: ParentTarget::Root,
                placement: Some(Placement::AddToEnd),
            }),
        })
        .expect("create chats");
    let plain = at_root(&mut store, "plain");
    let chat = store
        .create(CreateWidgetRequest {
            group_id: group(),
            widget_type: None,
            title: Some("general".to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: Some(ViewTarget::Chat(3)),
            position: None,
        })
        .expect("create chat");

    let err = store
        .reorder(ReorderWidgetRequest {
            id: plain.id,
            parent: ParentTarget::Under(chats.id),
            placement: None,
        })
        .expect_err("expected plain widget under chats to fail");
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
    assert_eq!(children(&store, None), named(&[("chats", 1), ("plain", 2)]));

    store
        .reorder(ReorderWidgetRequest {
            id: chat.id,
            parent: ParentTarget::Under(chats.id),
            placement: None,
        })
        .expect("chat under chats");
    assert_eq!(children(&store, Some(chats.id)), named(&[("general", 1)]));
}

#[test]
fn other_groups_are_untouched() {
    let mut store = SqliteStore::open(temp_dir("other_groups_are_untouched")).expect("open store");
    let other_group = GroupId::try_new(8).expect("group id");
    let foreign = store
        .create(CreateWidgetRequest {
            group_id: other_group,
            widget_type: None,
            title: Some("foreign".to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            position: Some(PositionHint {
                parent: ParentTarget::Root,
                placement: Some(Placement::AddToEnd),
            }),
        })
        .expect("create foreign");
    let a = at_root(&mut store, "A");

    let err = store
        .reorder(ReorderWidgetRequest {
            id: a.id,
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::InFrontOf(foreign.id)),
        })
        .expect_err("expected cross-group reference to fail");
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");

    let err = store
        .reorder(ReorderWidgetRequest {
            id: a.id,
            parent: ParentTarget::Under(foreign.id),
            placement: None,
        })
        .expect_err("expected cross-group parent to fail");
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");

    assert_eq!(
        store.widget(foreign.id).expect("fetch").expect("exists").order,
        Some(1)
    );
}
