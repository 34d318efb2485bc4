#![forbid(unsafe_code)]

use super::widgets::NewWidget;
use super::{ReorderWidgetRequest, StoreError, WidgetTx};
use cw_core::ids::{GroupId, WidgetId};
use cw_core::model::{ContextWidget, ViewTarget, Visibility, widget_types};
use cw_core::tree::{ParentTarget, Placement};
use tracing::{debug, info};

/// What the first child of a new group's `home` widget opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HomeView {
    #[default]
    Chat,
    Stream,
    Map,
}

impl HomeView {
    pub fn as_str(self) -> &'static str {
        match self {
            HomeView::Chat => "chat",
            HomeView::Stream => "stream",
            HomeView::Map => "map",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Some(HomeView::Chat),
            "stream" => Some(HomeView::Stream),
            "map" => Some(HomeView::Map),
            _ => None,
        }
    }
}

struct DefaultWidget {
    title: &'static str,
    widget_type: Option<&'static str>,
    view: Option<&'static str>,
    visibility: Visibility,
}

const fn entry(
    title: &'static str,
    widget_type: Option<&'static str>,
    view: Option<&'static str>,
) -> DefaultWidget {
    DefaultWidget {
        title,
        widget_type,
        view,
        visibility: Visibility::All,
    }
}

const fn admin(widget: DefaultWidget) -> DefaultWidget {
    DefaultWidget {
        visibility: Visibility::Admin,
        ..widget
    }
}

/// Root entries after `home`, numbered from 2.
const ORDERED_ROOTS: [DefaultWidget; 5] = [
    entry("widget-chats", Some(widget_types::CHATS), None),
    entry("widget-auto-view", Some(widget_types::AUTO_VIEW), None),
    entry("widget-members", Some(widget_types::MEMBERS), Some("members")),
    admin(entry("widget-setup", Some(widget_types::SETUP), None)),
    entry("widget-custom-views", Some(widget_types::CUSTOM_VIEWS), None),
];

/// Reachable from the "all views" page only.
const UNORDERED: [DefaultWidget; 14] = [
    entry("widget-about", Some(widget_types::ABOUT), Some("about")),
    entry("widget-discussions", None, Some("discussions")),
    entry("widget-events", Some(widget_types::EVENTS), Some("events")),
    entry("widget-groups", Some(widget_types::GROUPS), Some("groups")),
    entry("widget-map", Some(widget_types::MAP), Some("map")),
    entry("widget-moderation", Some(widget_types::MODERATION), Some("moderation")),
    entry("widget-projects", Some(widget_types::PROJECTS), Some("projects")),
    entry("widget-proposals", Some(widget_types::PROPOSALS), Some("proposals")),
    entry("widget-requests-and-offers", None, Some("requests-and-offers")),
    entry("widget-resources", Some(widget_types::RESOURCES), Some("resources")),
    entry("widget-stream", None, Some("stream")),
    entry("widget-topics", Some(widget_types::TOPICS), Some("topics")),
    admin(entry("widget-tracks", Some(widget_types::TRACKS), Some("tracks"))),
    admin(entry(
        "widget-funding-rounds",
        Some(widget_types::FUNDING_ROUNDS),
        Some("funding-rounds"),
    )),
];

const GENERAL_CHAT_TITLE: &str = "general";
const RESOURCES_TITLE: &str = "widget-resources";

/// Content slots of the `auto-view` container, in the order they are placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AutoViewSlot {
    Stream,
    Discussions,
    Events,
    Projects,
    AskAndOffer,
    Resources,
    Decisions,
    Map,
    Groups,
}

impl AutoViewSlot {
    pub const ALL: [AutoViewSlot; 9] = [
        AutoViewSlot::Stream,
        AutoViewSlot::Discussions,
        AutoViewSlot::Events,
        AutoViewSlot::Projects,
        AutoViewSlot::AskAndOffer,
        AutoViewSlot::Resources,
        AutoViewSlot::Decisions,
        AutoViewSlot::Map,
        AutoViewSlot::Groups,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AutoViewSlot::Stream => "stream",
            AutoViewSlot::Discussions => "discussions",
            AutoViewSlot::Events => "events",
            AutoViewSlot::Projects => "projects",
            AutoViewSlot::AskAndOffer => "ask-and-offer",
            AutoViewSlot::Resources => "resources",
            AutoViewSlot::Decisions => "decisions",
            AutoViewSlot::Map => "map",
            AutoViewSlot::Groups => "groups",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|slot| slot.as_str() == value)
    }

    pub fn matches(self, widget: &ContextWidget) -> bool {
        let view = match widget.view_target.as_ref() {
            Some(ViewTarget::View(name)) => Some(name.as_str()),
            _ => None,
        };
        match self {
            AutoViewSlot::Stream => view == Some("stream"),
            AutoViewSlot::Discussions => view == Some("discussions"),
            AutoViewSlot::Events => widget.has_type(widget_types::EVENTS),
            AutoViewSlot::Projects => widget.has_type(widget_types::PROJECTS),
            AutoViewSlot::AskAndOffer => {
                matches!(view, Some("ask-and-offer" | "requests-and-offers"))
            }
            AutoViewSlot::Resources => view == Some("resources"),
            AutoViewSlot::Decisions => {
                widget.has_type(widget_types::DECISIONS) || widget.has_type(widget_types::PROPOSALS)
            }
            AutoViewSlot::Map => widget.has_type(widget_types::MAP),
            AutoViewSlot::Groups => widget.has_type(widget_types::GROUPS),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub resources_created: bool,
    /// Widgets moved under `auto-view`, in placement order.
    pub placed: Vec<WidgetId>,
}

impl WidgetTx<'_> {
    /// Seeds the default menu of a group. Returns `false` without writing
    /// anything when the group already has widgets.
    ///
    /// `general_chat_id` is the chat the `Chat` home view (or the standalone
    /// general chat entry) opens.
    pub fn setup_default_menu(
        &self,
        group_id: GroupId,
        home_view: HomeView,
        general_chat_id: i64,
    ) -> Result<bool, StoreError> {
        if !self.fetch_all_for_group(group_id)?.is_empty() {
            debug!(group_id = group_id.get(), "group menu already set up");
            return Ok(false);
        }

        let home_id = self.insert_widget(NewWidget {
            group_id,
            parent_id: None,
            order: Some(1),
            auto_added: false,
            widget_type: Some(widget_types::HOME),
            title: Some("widget-home"),
            icon: None,
            visibility: Visibility::All,
            view_target: None,
        })?;

        let general_chat = ViewTarget::Chat(general_chat_id);
        let (home_type, home_title, home_target) = match home_view {
            HomeView::Chat => (Some(widget_types::VIEW_CHAT), None, general_chat.clone()),
            HomeView::Stream => (None, Some("widget-stream"), ViewTarget::View("stream".to_string())),
            HomeView::Map => (
                Some(widget_types::MAP),
                Some("widget-map"),
                ViewTarget::View("map".to_string()),
            ),
        };
        self.insert_widget(NewWidget {
            group_id,
            parent_id: Some(home_id),
            order: Some(1),
            auto_added: false,
            widget_type: home_type,
            title: home_title,
            icon: None,
            visibility: Visibility::All,
            view_target: Some(&home_target),
        })?;

        for (index, widget) in ORDERED_ROOTS.iter().enumerate() {
            let order = u32::try_from(index + 2)
                .map_err(|_| StoreError::Validation("default menu is too long"))?;
            self.insert_default(group_id, widget, Some(order))?;
        }

        let skipped_view = match home_view {
            HomeView::Chat => None,
            HomeView::Stream => Some("widget-stream"),
            HomeView::Map => Some("widget-map"),
        };
        for widget in UNORDERED
            .iter()
            .filter(|widget| Some(widget.title) != skipped_view)
        {
            self.insert_default(group_id, widget, None)?;
        }

        if home_view != HomeView::Chat {
            self.insert_widget(NewWidget {
                group_id,
                parent_id: None,
                order: None,
                auto_added: false,
                widget_type: Some(widget_types::VIEW_CHAT),
                title: Some(GENERAL_CHAT_TITLE),
                icon: None,
                visibility: Visibility::All,
                view_target: Some(&general_chat),
            })?;
        }

        info!(
            group_id = group_id.get(),
            home_view = home_view.as_str(),
            "seeded default menu"
        );
        Ok(true)
    }

    /// Moves the content widgets for `present` slots under the `auto-view`
    /// container, in canonical slot order. The stream widget is placed whenever
    /// it is out of the menu; other widgets only while still `auto_added = false`.
    pub fn backfill_auto_view(
        &self,
        group_id: GroupId,
        present: &[AutoViewSlot],
    ) -> Result<BackfillReport, StoreError> {
        let mut report = BackfillReport::default();

        let existing = self.fetch_all_for_group(group_id)?;
        let has_resources = existing.iter().any(|widget| {
            widget.title.as_deref() == Some(RESOURCES_TITLE)
                || AutoViewSlot::Resources.matches(widget)
        });
        if !has_resources {
            let resources = ViewTarget::View("resources".to_string());
            self.insert_widget(NewWidget {
                group_id,
                parent_id: None,
                order: None,
                auto_added: false,
                widget_type: Some(widget_types::RESOURCES),
                title: Some(RESOURCES_TITLE),
                icon: None,
                visibility: Visibility::All,
                view_target: Some(&resources),
            })?;
            report.resources_created = true;
        }

        let widgets = self.fetch_all_for_group(group_id)?;
        let Some(auto_view) = widgets
            .iter()
            .find(|widget| widget.has_type(widget_types::AUTO_VIEW))
        else {
            return Err(StoreError::Validation("group has no auto-view widget"));
        };

        for slot in AutoViewSlot::ALL {
            let wanted = slot == AutoViewSlot::Stream || present.contains(&slot);
            if !wanted {
                continue;
            }
            let candidates = widgets
                .iter()
                .filter(|widget| slot.matches(widget))
                .filter(|widget| widget.parent_id != Some(auto_view.id))
                .filter(|widget| !report.placed.contains(&widget.id))
                .filter(|widget| match slot {
                    AutoViewSlot::Stream => !widget.is_ordered(),
                    _ => !widget.auto_added,
                })
                .collect::<Vec<_>>();
            for widget in candidates {
                self.reorder(ReorderWidgetRequest {
                    id: widget.id,
                    parent: ParentTarget::Under(auto_view.id),
                    placement: Some(Placement::AddToEnd),
                })?;
                report.placed.push(widget.id);
            }
        }

        info!(
            group_id = group_id.get(),
            placed = report.placed.len(),
            resources_created = report.resources_created,
            "backfilled auto-view"
        );
        Ok(report)
    }

    fn insert_default(
        &self,
        group_id: GroupId,
        widget: &DefaultWidget,
        order: Option<u32>,
    ) -> Result<WidgetId, StoreError> {
        let target = widget.view.map(|view| ViewTarget::View(view.to_string()));
        self.insert_widget(NewWidget {
            group_id,
            parent_id: None,
            order,
            auto_added: false,
            widget_type: widget.widget_type,
            title: Some(widget.title),
            icon: None,
            visibility: widget.visibility,
            view_target: target.as_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_parse_their_names() {
        for slot in AutoViewSlot::ALL {
            assert_eq!(AutoViewSlot::parse(slot.as_str()), Some(slot));
        }
        assert_eq!(AutoViewSlot::parse("polls"), None);
        assert_eq!(HomeView::parse("STREAM"), Some(HomeView::Stream));
        assert_eq!(HomeView::parse("feed"), None);
    }

    #[test]
    fn default_tables_have_unique_titles() {
        let mut titles = ORDERED_ROOTS
            .iter()
            .chain(UNORDERED.iter())
            .map(|widget| widget.title)
            .collect::<Vec<_>>();
        let total = titles.len();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), total);
    }
}
