#![forbid(unsafe_code)]

use super::widgets::NewWidget;
use super::{
    CreateWidgetRequest, PositionHint, ReorderWidgetRequest, SetHomeWidgetRequest, StoreError,
    UpdateWidgetRequest, WidgetTx,
};
use cw_core::ids::WidgetId;
use cw_core::model::{ContextWidget, is_valid_home_widget, widget_is_valid_child, widget_types};
use cw_core::tree::{
    HomeLayout, MoveRequest, ReorderPlan, remove_from_tree, reorder_tree, replace_home_widget,
};
use tracing::{debug, warn};

impl WidgetTx<'_> {
    /// Inserts an unordered widget, then places it when a position hint is given.
    pub fn create(&self, request: CreateWidgetRequest) -> Result<ContextWidget, StoreError> {
        let id = self.insert_widget(NewWidget {
            group_id: request.group_id,
            parent_id: None,
            order: None,
            auto_added: true,
            widget_type: request.widget_type.as_deref(),
            title: request.title.as_deref(),
            icon: request.icon.as_deref(),
            visibility: request.visibility,
            view_target: request.view_target.as_ref(),
        })?;
        debug!(widget_id = id.get(), group_id = request.group_id.get(), "created context widget");

        if let Some(position) = request.position.filter(places_widget) {
            self.reorder(ReorderWidgetRequest {
                id,
                parent: position.parent,
                placement: position.placement,
            })?;
        }
        self.require(id)
    }

    pub fn reorder(&self, request: ReorderWidgetRequest) -> Result<ContextWidget, StoreError> {
        let moved = self.require(request.id)?;
        let all = self.fetch_all_for_group(moved.group_id)?;
        let positions = all.iter().map(ContextWidget::position).collect::<Vec<_>>();

        let plan = reorder_tree(
            &positions,
            &MoveRequest {
                widget_id: moved.id,
                parent: request.parent,
                placement: request.placement,
            },
        )
        .inspect_err(|err| warn!(widget_id = moved.id.get(), %err, "rejected widget move"))?;

        let new_parent = plan.update_for(moved.id).and_then(|update| update.parent_id);
        if let Some(parent_id) = new_parent.filter(|parent_id| moved.parent_id != Some(*parent_id)) {
            let parent = all
                .iter()
                .find(|widget| widget.id == parent_id)
                .ok_or(StoreError::Validation("parent widget does not belong to this group"))?;
            if !widget_is_valid_child(&moved, parent) {
                warn!(widget_id = moved.id.get(), parent_id = parent_id.get(), "invalid parent");
                return Err(StoreError::Validation("parent widget cannot hold this widget"));
            }
        }

        self.write_plan(&plan)?;
        debug!(
            widget_id = moved.id.get(),
            group_id = moved.group_id.get(),
            updated = plan.updates.len(),
            "reordered context widget"
        );
        self.require(moved.id)
    }

    /// Applies field changes, then moves the widget when the request carries a
    /// placement or names a parent other than the current one.
    pub fn update(&self, request: UpdateWidgetRequest) -> Result<ContextWidget, StoreError> {
        let widget = self.require(request.id)?;
        let auto_added = !self.config.manual_updates_clear_auto_added;
        self.patch_fields(widget.id, &request.patch, auto_added)?;

        if let Some(position) = request.position.filter(|hint| moves_widget(&widget, hint)) {
            self.reorder(ReorderWidgetRequest {
                id: widget.id,
                parent: position.parent,
                placement: position.placement,
            })?;
            if !auto_added {
                self.set_auto_added(widget.id, false)?;
            }
        }
        self.require(widget.id)
    }

    /// Takes a widget out of the menu and closes the gap among its siblings.
    /// The row itself is kept.
    pub fn remove_from_menu(&self, id: WidgetId) -> Result<ContextWidget, StoreError> {
        let widget = self.require(id)?;
        if !widget.is_ordered() {
            debug!(widget_id = id.get(), "widget already out of the menu");
            return Ok(widget);
        }

        let peers = self
            .fetch_siblings(&widget)?
            .iter()
            .map(ContextWidget::position)
            .collect::<Vec<_>>();
        let plan = remove_from_tree(&peers, widget.id);
        self.write_plan(&plan)?;
        debug!(
            widget_id = id.get(),
            shifted = plan.updates.len(),
            "removed context widget from menu"
        );
        self.require(id)
    }

    pub fn set_home_widget(&self, request: SetHomeWidgetRequest) -> Result<ContextWidget, StoreError> {
        let widget = self.require(request.widget_id)?;
        if widget.group_id != request.group_id {
            return Err(StoreError::Validation("widget does not belong to this group"));
        }
        if !is_valid_home_widget(&widget) {
            return Err(StoreError::Validation("home view must open a view or an entity"));
        }

        let all = self.fetch_all_for_group(request.group_id)?;
        let home = all
            .iter()
            .find(|candidate| candidate.has_type(widget_types::HOME))
            .ok_or(StoreError::Validation("group has no home widget"))?;
        let current = all
            .iter()
            .filter(|candidate| candidate.parent_id == Some(home.id) && candidate.is_ordered())
            .min_by_key(|candidate| (candidate.order, candidate.id));
        let layout = HomeLayout {
            home_id: home.id,
            chats_id: all
                .iter()
                .find(|candidate| candidate.has_type(widget_types::CHATS))
                .map(|chats| chats.id),
            current_home_is_chat: current.is_some_and(ContextWidget::is_chat),
        };

        let positions = all.iter().map(ContextWidget::position).collect::<Vec<_>>();
        let plan = replace_home_widget(&positions, &layout, widget.id)?;
        self.write_plan(&plan)?;
        debug!(
            widget_id = widget.id.get(),
            group_id = request.group_id.get(),
            "set home widget"
        );
        self.require(widget.id)
    }

    /// Position updates first, then rows leaving the menu.
    fn write_plan(&self, plan: &ReorderPlan) -> Result<(), StoreError> {
        self.bulk_set_fields(&plan.updates)?;
        self.clear_positions(&plan.cleared)?;
        Ok(())
    }
}

/// A hint naming neither a parent nor a placement leaves a new widget unordered.
fn places_widget(hint: &PositionHint) -> bool {
    hint.placement.is_some() || hint.parent.requested().is_some()
}

fn moves_widget(widget: &ContextWidget, hint: &PositionHint) -> bool {
    hint.placement.is_some()
        || hint
            .parent
            .requested()
            .is_some_and(|parent| parent != widget.parent_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::ids::GroupId;
    use cw_core::model::Visibility;
    use cw_core::tree::{ParentTarget, Placement, WidgetPosition};

    fn widget(parent: Option<i64>) -> ContextWidget {
        ContextWidget {
            id: WidgetId::try_new(5).unwrap(),
            group_id: GroupId::try_new(1).unwrap(),
            parent_id: parent.map(|id| WidgetId::try_new(id).unwrap()),
            order: Some(1),
            auto_added: false,
            widget_type: None,
            title: None,
            icon: None,
            visibility: Visibility::All,
            view_target: None,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    #[test]
    fn moves_widget_only_on_placement_or_parent_change() {
        let child = widget(Some(2));
        assert!(!moves_widget(&child, &PositionHint::default()));
        assert!(!moves_widget(
            &child,
            &PositionHint {
                parent: ParentTarget::Under(WidgetId::try_new(2).unwrap()),
                placement: None,
            }
        ));
        assert!(moves_widget(
            &child,
            &PositionHint {
                parent: ParentTarget::Root,
                placement: None,
            }
        ));
        assert!(moves_widget(
            &child,
            &PositionHint {
                parent: ParentTarget::Unchanged,
                placement: Some(Placement::AddToEnd),
            }
        ));
    }

    #[test]
    fn empty_hint_does_not_place_a_new_widget() {
        assert!(!places_widget(&PositionHint::default()));
        assert!(places_widget(&PositionHint {
            parent: ParentTarget::Root,
            placement: None,
        }));
        assert!(places_widget(&PositionHint {
            parent: ParentTarget::Unchanged,
            placement: Some(Placement::AddToEnd),
        }));
    }

    #[test]
    fn positions_follow_widget_fields() {
        let child = widget(Some(2));
        assert_eq!(
            child.position(),
            WidgetPosition {
                id: child.id,
                parent_id: child.parent_id,
                order: Some(1),
            }
        );
    }
}
