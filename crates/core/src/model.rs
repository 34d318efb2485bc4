#![forbid(unsafe_code)]

use crate::ids::{GroupId, WidgetId};
use crate::tree::WidgetPosition;

/// Well-known values of the `type` column. Widgets without a type are plain
/// entries whose behavior comes from their view target.
pub mod widget_types {
    pub const HOME: &str = "home";
    pub const CHATS: &str = "chats";
    pub const AUTO_VIEW: &str = "auto-view";
    pub const MEMBERS: &str = "members";
    pub const SETUP: &str = "setup";
    pub const CUSTOM_VIEWS: &str = "custom-views";
    pub const VIEW_CHAT: &str = "viewChat";
    pub const ABOUT: &str = "about";
    pub const EVENTS: &str = "events";
    pub const GROUPS: &str = "groups";
    pub const MAP: &str = "map";
    pub const MODERATION: &str = "moderation";
    pub const PROJECTS: &str = "projects";
    pub const PROPOSALS: &str = "proposals";
    pub const DECISIONS: &str = "decisions";
    pub const RESOURCES: &str = "resources";
    pub const TOPICS: &str = "topics";
    pub const TRACKS: &str = "tracks";
    pub const FUNDING_ROUNDS: &str = "funding-rounds";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    All,
    Admin,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::All => "all",
            Visibility::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Visibility::All),
            "admin" => Some(Visibility::Admin),
            _ => None,
        }
    }
}

/// What a widget opens when selected. A widget points at no more than one
/// target, so switching targets replaces the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewTarget {
    Post(i64),
    Chat(i64),
    Group(i64),
    User(i64),
    CustomView(i64),
    Track(i64),
    FundingRound(i64),
    View(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewTargetError {
    MissingSeparator,
    UnknownKind,
    InvalidId,
    EmptyView,
}

impl ViewTargetError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingSeparator => "view target must look like kind:value",
            Self::UnknownKind => {
                "view target kind must be one of post, chat, group, user, custom, track, funding-round, view"
            }
            Self::InvalidId => "view target id must be a positive integer",
            Self::EmptyView => "view name must not be empty",
        }
    }
}

impl ViewTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            ViewTarget::Post(_) => "post",
            ViewTarget::Chat(_) => "chat",
            ViewTarget::Group(_) => "group",
            ViewTarget::User(_) => "user",
            ViewTarget::CustomView(_) => "custom",
            ViewTarget::Track(_) => "track",
            ViewTarget::FundingRound(_) => "funding-round",
            ViewTarget::View(_) => "view",
        }
    }

    /// Parses `kind:value`, e.g. `chat:12` or `view:stream`.
    pub fn parse(value: &str) -> Result<Self, ViewTargetError> {
        let (kind, raw) = value
            .trim()
            .split_once(':')
            .ok_or(ViewTargetError::MissingSeparator)?;
        let raw = raw.trim();
        if kind == "view" {
            if raw.is_empty() {
                return Err(ViewTargetError::EmptyView);
            }
            return Ok(ViewTarget::View(raw.to_string()));
        }
        let id = raw
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ViewTargetError::InvalidId)?;
        match kind {
            "post" => Ok(ViewTarget::Post(id)),
            "chat" => Ok(ViewTarget::Chat(id)),
            "group" => Ok(ViewTarget::Group(id)),
            "user" => Ok(ViewTarget::User(id)),
            "custom" => Ok(ViewTarget::CustomView(id)),
            "track" => Ok(ViewTarget::Track(id)),
            "funding-round" => Ok(ViewTarget::FundingRound(id)),
            _ => Err(ViewTargetError::UnknownKind),
        }
    }

    /// Entity targets (everything except a built-in view) are leaves in the menu.
    pub fn is_entity(&self) -> bool {
        !matches!(self, ViewTarget::View(_))
    }
}

impl std::fmt::Display for ViewTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewTarget::View(name) => write!(f, "view:{name}"),
            ViewTarget::Post(id)
            | ViewTarget::Chat(id)
            | ViewTarget::Group(id)
            | ViewTarget::User(id)
            | ViewTarget::CustomView(id)
            | ViewTarget::Track(id)
            | ViewTarget::FundingRound(id) => write!(f, "{}:{id}", self.kind()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextWidget {
    pub id: WidgetId,
    pub group_id: GroupId,
    pub parent_id: Option<WidgetId>,
    pub order: Option<u32>,
    pub auto_added: bool,
    pub widget_type: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub visibility: Visibility,
    pub view_target: Option<ViewTarget>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl ContextWidget {
    pub fn position(&self) -> WidgetPosition {
        WidgetPosition {
            id: self.id,
            parent_id: self.parent_id,
            order: self.order,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    pub fn has_type(&self, widget_type: &str) -> bool {
        self.widget_type.as_deref() == Some(widget_type)
    }

    pub fn is_chat(&self) -> bool {
        matches!(self.view_target, Some(ViewTarget::Chat(_))) || self.has_type(widget_types::VIEW_CHAT)
    }
}

/// Whether `child` may be placed directly under `parent` in the menu.
pub fn widget_is_valid_child(child: &ContextWidget, parent: &ContextWidget) -> bool {
    if child.id == parent.id {
        return false;
    }
    if child.has_type(widget_types::HOME) {
        return false;
    }
    if parent.view_target.as_ref().is_some_and(ViewTarget::is_entity) {
        return false;
    }
    if parent.has_type(widget_types::MEMBERS) || parent.has_type(widget_types::SETUP) {
        return false;
    }
    if parent.has_type(widget_types::CHATS) && !matches!(child.view_target, Some(ViewTarget::Chat(_))) {
        return false;
    }
    if parent.has_type(widget_types::CUSTOM_VIEWS)
        && !matches!(child.view_target, Some(ViewTarget::CustomView(_)))
    {
        return false;
    }
    true
}

/// A home view must open something: an entity or a built-in view.
pub fn is_valid_home_widget(widget: &ContextWidget) -> bool {
    widget.view_target.is_some()
}
