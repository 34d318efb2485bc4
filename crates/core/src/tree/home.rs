#![forbid(unsafe_code)]

use super::forest::Forest;
use super::{ReorderPlan, TreeError, WidgetPosition};
use crate::ids::WidgetId;

/// The widgets a home swap touches besides the new home view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HomeLayout {
    pub home_id: WidgetId,
    pub chats_id: Option<WidgetId>,
    /// Whether the current home view is a chat, which keeps it in the menu.
    pub current_home_is_chat: bool,
}

/// Makes `new_home` the first child of the home container.
///
/// The previous home view moves to the top of the chats container when it is
/// a chat and the group has one; otherwise it leaves the menu. The group
/// `new_home` came from is renumbered.
pub fn replace_home_widget(
    all: &[WidgetPosition],
    layout: &HomeLayout,
    new_home: WidgetId,
) -> Result<ReorderPlan, TreeError> {
    let mut forest = Forest::new(all);
    if !forest.contains(new_home) {
        return Err(TreeError::UnknownWidget(new_home));
    }
    if new_home == layout.home_id {
        return Err(TreeError::HomeContainer);
    }
    if !forest.contains(layout.home_id) {
        return Err(TreeError::UnknownParent(layout.home_id));
    }
    if forest.has_ancestor(layout.home_id, new_home) {
        return Err(TreeError::ParentCycle);
    }

    let current = forest.members(Some(layout.home_id)).first().copied();
    if current == Some(new_home) {
        return Ok(ReorderPlan::default());
    }

    forest.detach(new_home);
    if let Some(current) = current {
        forest.detach(current);
        let chats = layout
            .chats_id
            .filter(|chats| *chats != current && forest.contains(*chats));
        if let (true, Some(chats)) = (layout.current_home_is_chat, chats) {
            forest.insert_at(current, Some(chats), 0);
        }
    }
    forest.insert_at(new_home, Some(layout.home_id), 0);

    Ok(forest.into_plan(&[new_home]))
}
