#![forbid(unsafe_code)]

use super::forest::{Forest, Slot};
use super::{MoveRequest, Placement, ReorderPlan, TreeError, WidgetPosition};
use crate::ids::WidgetId;

/// Computes the rows to write when `request.widget_id` moves.
///
/// `all` is every row of the widget's group. The destination sibling group
/// comes from `InFrontOf` (the reference widget's group) or else from
/// `request.parent`, defaulting to the widget's current parent. Both the
/// destination group and the group the widget leaves are renumbered `1..N`.
pub fn reorder_tree(
    all: &[WidgetPosition],
    request: &MoveRequest,
) -> Result<ReorderPlan, TreeError> {
    let mut forest = Forest::new(all);
    let moved_id = request.widget_id;
    let moved = forest
        .slot(moved_id)
        .ok_or(TreeError::UnknownWidget(moved_id))?;

    let destination = resolve_destination(&forest, request, moved)?;
    if let Some(parent) = destination {
        validate_parent(&forest, moved_id, parent)?;
    }

    forest.detach(moved_id);
    let members = forest.members(destination);
    let index = match request.placement {
        Some(Placement::InFrontOf(reference)) => members
            .iter()
            .position(|member| *member == reference)
            .ok_or(TreeError::ReferenceOutsideSiblingGroup(reference))?,
        Some(Placement::AddToEnd) | None => members.len(),
    };
    forest.insert_at(moved_id, destination, index);

    Ok(forest.into_plan(&[moved_id]))
}

/// Closes the gap a widget leaves in `peers` and takes it out of the menu.
/// An unordered or unknown widget yields an empty plan.
pub fn remove_from_tree(peers: &[WidgetPosition], widget_id: WidgetId) -> ReorderPlan {
    let mut forest = Forest::new(peers);
    match forest.slot(widget_id) {
        Some(slot) if slot.order.is_some() => {
            forest.detach(widget_id);
            forest.into_plan(&[])
        }
        _ => ReorderPlan::default(),
    }
}

fn resolve_destination(
    forest: &Forest,
    request: &MoveRequest,
    moved: Slot,
) -> Result<Option<WidgetId>, TreeError> {
    let requested = request.parent.requested();
    match request.placement {
        Some(Placement::InFrontOf(reference)) => {
            if reference == request.widget_id {
                return Err(TreeError::SelfReference);
            }
            let slot = forest
                .slot(reference)
                .ok_or(TreeError::UnknownReference(reference))?;
            if slot.order.is_none() {
                return Err(TreeError::ReferenceNotOrdered(reference));
            }
            if requested.is_some_and(|parent| parent != slot.parent_id) {
                return Err(TreeError::ReferenceOutsideSiblingGroup(reference));
            }
            Ok(slot.parent_id)
        }
        Some(Placement::AddToEnd) | None => Ok(requested.unwrap_or(moved.parent_id)),
    }
}

fn validate_parent(forest: &Forest, moved: WidgetId, parent: WidgetId) -> Result<(), TreeError> {
    if parent == moved {
        return Err(TreeError::SelfParent);
    }
    if !forest.contains(parent) {
        return Err(TreeError::UnknownParent(parent));
    }
    if forest.has_ancestor(parent, moved) {
        return Err(TreeError::ParentCycle);
    }
    Ok(())
}
