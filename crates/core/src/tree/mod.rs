#![forbid(unsafe_code)]

//! Sibling ordering for a group's menu forest.
//!
//! Every function here is pure: it takes a snapshot of `(id, parent_id, order)`
//! rows for one group and returns the rows to write. Positions are recomputed
//! for whole sibling groups, so a group always comes out numbered `1..N`
//! even if the snapshot had gaps or duplicates.

mod density;
mod forest;
mod home;
mod menu;
mod reorder;

pub use density::*;
pub use home::*;
pub use menu::*;
pub use reorder::*;

use crate::ids::WidgetId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WidgetPosition {
    pub id: WidgetId,
    pub parent_id: Option<WidgetId>,
    pub order: Option<u32>,
}

/// Where the moved widget's sibling group should be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParentTarget {
    #[default]
    Unchanged,
    Root,
    Under(WidgetId),
}

impl ParentTarget {
    /// `None` when the request does not name a parent.
    pub fn requested(self) -> Option<Option<WidgetId>> {
        match self {
            ParentTarget::Unchanged => None,
            ParentTarget::Root => Some(None),
            ParentTarget::Under(parent) => Some(Some(parent)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    AddToEnd,
    InFrontOf(WidgetId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub widget_id: WidgetId,
    pub parent: ParentTarget,
    pub placement: Option<Placement>,
}

/// Rows to write after a tree operation. `updates` carry the new position of
/// every row that moved, `cleared` lists rows leaving the menu.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReorderPlan {
    pub updates: Vec<WidgetPosition>,
    pub cleared: Vec<WidgetId>,
}

impl ReorderPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.cleared.is_empty()
    }

    pub fn update_for(&self, id: WidgetId) -> Option<&WidgetPosition> {
        self.updates.iter().find(|update| update.id == id)
    }

    /// Applies the plan to a snapshot in place.
    pub fn apply_to(&self, rows: &mut [WidgetPosition]) {
        for row in rows.iter_mut() {
            if let Some(update) = self.update_for(row.id) {
                row.parent_id = update.parent_id;
                row.order = update.order;
            } else if self.cleared.contains(&row.id) {
                row.parent_id = None;
                row.order = None;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    UnknownWidget(WidgetId),
    UnknownReference(WidgetId),
    ReferenceNotOrdered(WidgetId),
    ReferenceOutsideSiblingGroup(WidgetId),
    SelfReference,
    UnknownParent(WidgetId),
    SelfParent,
    ParentCycle,
    HomeContainer,
}

impl TreeError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownWidget(_) => "widget does not belong to this group",
            Self::UnknownReference(_) => "order_in_front_of widget does not belong to this group",
            Self::ReferenceNotOrdered(_) => "order_in_front_of widget is not in the menu",
            Self::ReferenceOutsideSiblingGroup(_) => {
                "order_in_front_of widget is not under the requested parent"
            }
            Self::SelfReference => "a widget cannot be ordered in front of itself",
            Self::UnknownParent(_) => "parent widget does not belong to this group",
            Self::SelfParent => "a widget cannot be its own parent",
            Self::ParentCycle => "parent widget is a descendant of the moved widget",
            Self::HomeContainer => "the home container cannot be its own home view",
        }
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownWidget(id)
            | Self::UnknownReference(id)
            | Self::ReferenceNotOrdered(id)
            | Self::ReferenceOutsideSiblingGroup(id)
            | Self::UnknownParent(id) => write!(f, "{} (id={id})", self.message()),
            _ => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for TreeError {}
