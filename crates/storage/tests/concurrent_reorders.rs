#![forbid(unsafe_code)]

use cw_core::ids::GroupId;
use cw_core::model::Visibility;
use cw_core::tree::{ParentTarget, Placement};
use cw_storage::{
    CreateWidgetRequest, PositionHint, ReorderWidgetRequest, SqliteStore, StoreError,
};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

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

#[test]
fn concurrent_reorders_of_one_group_stay_dense() {
    let storage_dir = temp_dir("concurrent_reorders_of_one_group_stay_dense");
    let group = GroupId::try_new(4).expect("group id");

    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let parent = store
        .create(CreateWidgetRequest {
            group_id: group,
            widget_type: None,
            title: Some("parent".to_string()),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            position: Some(PositionHint {
                parent: ParentTarget::Root,
                placement: Some(Placement::AddToEnd),
            }),
        })
        .expect("create parent");
    let ids = (0..8)
        .map(|index| {
            store
                .create(CreateWidgetRequest {
                    group_id: group,
                    widget_type: None,
                    title: Some(format!("w{index}")),
                    icon: None,
                    visibility: Visibility::All,
                    view_target: None,
                    position: Some(PositionHint {
                        parent: ParentTarget::Root,
                        placement: Some(Placement::AddToEnd),
                    }),
                })
                .expect("create widget")
                .id
        })
        .collect::<Vec<_>>();

    let barrier = Arc::new(Barrier::new(2));
    let workers = (0..2usize)
        .map(|worker| {
            let storage_dir = storage_dir.clone();
            let ids = ids.clone();
            let barrier = Arc::clone(&barrier);
            let parent_id = parent.id;
            thread::spawn(move || {
                let mut store = SqliteStore::open(&storage_dir).expect("open store");
                barrier.wait();
                let mut moves = 0usize;
                for step in 0..40usize {
                    let moved = ids[(step * 3 + worker) % ids.len()];
                    let reference = ids[(step * 5 + worker * 2 + 1) % ids.len()];
                    let parent = if (step + worker) % 4 == 0 {
                        ParentTarget::Under(parent_id)
                    } else {
                        ParentTarget::Root
                    };
                    let placement = if step % 2 == 0 {
                        Some(Placement::AddToEnd)
                    } else {
                        Some(Placement::InFrontOf(reference))
                    };
                    // In-front-of targets may have moved under the other
                    // worker; only those moves may be rejected.
                    match store.reorder(ReorderWidgetRequest {
                        id: moved,
                        parent,
                        placement,
                    }) {
                        Ok(_) => moves += 1,
                        Err(StoreError::Validation(_)) => {}
                        Err(err) => panic!("worker {worker} step {step}: reorder failed: {err:?}"),
                    }
                    if step % 7 == 0 {
                        store.remove_from_menu(reference).unwrap_or_else(|err| {
                            panic!("worker {worker} step {step}: remove failed: {err:?}")
                        });
                    }
                }
                moves
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        let moves = worker.join().expect("worker thread");
        assert!(moves > 0, "worker completed no moves");
    }

    let violation = store.check_menu(group).expect("check menu");
    assert!(violation.is_none(), "menu lost density: {violation:?}");
}
