#![forbid(unsafe_code)]

use crate::ids::WidgetId;
use crate::model::ContextWidget;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuNode {
    pub widget: ContextWidget,
    pub children: Vec<MenuNode>,
}

/// Builds the navigable menu: ordered widgets reachable from the root group.
/// Unordered widgets and anything hanging below them are left out.
pub fn build_menu(widgets: Vec<ContextWidget>) -> Vec<MenuNode> {
    let mut by_parent: BTreeMap<Option<WidgetId>, Vec<ContextWidget>> = BTreeMap::new();
    for widget in widgets.into_iter().filter(ContextWidget::is_ordered) {
        by_parent.entry(widget.parent_id).or_default().push(widget);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|widget| (widget.order, widget.id));
    }
    let mut visited = BTreeSet::new();
    take_children(&mut by_parent, None, &mut visited)
}

fn take_children(
    by_parent: &mut BTreeMap<Option<WidgetId>, Vec<ContextWidget>>,
    parent_id: Option<WidgetId>,
    visited: &mut BTreeSet<WidgetId>,
) -> Vec<MenuNode> {
    let siblings = by_parent.remove(&parent_id).unwrap_or_default();
    let mut nodes = Vec::with_capacity(siblings.len());
    for widget in siblings {
        if !visited.insert(widget.id) {
            continue;
        }
        let children = take_children(by_parent, Some(widget.id), visited);
        nodes.push(MenuNode { widget, children });
    }
    nodes
}
