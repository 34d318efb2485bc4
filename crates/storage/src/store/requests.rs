#![forbid(unsafe_code)]

use cw_core::ids::{GroupId, WidgetId};
use cw_core::model::{ViewTarget, Visibility};
use cw_core::tree::{ParentTarget, Placement};

/// Positional part of a create or update call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionHint {
    pub parent: ParentTarget,
    pub placement: Option<Placement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateWidgetRequest {
    pub group_id: GroupId,
    pub widget_type: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub visibility: Visibility,
    pub view_target: Option<ViewTarget>,
    /// `None` leaves the widget out of the menu.
    pub position: Option<PositionHint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReorderWidgetRequest {
    pub id: WidgetId,
    pub parent: ParentTarget,
    pub placement: Option<Placement>,
}

/// Field changes for `update`. `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WidgetPatch {
    pub widget_type: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub visibility: Option<Visibility>,
    pub view_target: Option<ViewTarget>,
}

impl WidgetPatch {
    pub fn is_empty(&self) -> bool {
        self.widget_type.is_none()
            && self.title.is_none()
            && self.icon.is_none()
            && self.visibility.is_none()
            && self.view_target.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateWidgetRequest {
    pub id: WidgetId,
    pub patch: WidgetPatch,
    pub position: Option<PositionHint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetHomeWidgetRequest {
    pub group_id: GroupId,
    pub widget_id: WidgetId,
}
