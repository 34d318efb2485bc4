#![forbid(unsafe_code)]

use super::{StoreConfig, StoreError, WidgetPatch, now_ms};
use cw_core::ids::{GroupId, WidgetId};
use cw_core::model::{ContextWidget, ViewTarget, Visibility};
use cw_core::tree::WidgetPosition;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};

const WIDGET_COLUMNS: &str = "id, group_id, parent_id, \"order\", auto_added, type, title, icon, visibility, \
     view, view_post_id, view_chat_id, view_group_id, view_user_id, custom_view_id, view_track_id, \
     view_funding_round_id, created_at_ms, updated_at_ms";

/// An open write transaction over the widget table.
///
/// Every read and write of a mutation goes through the same handle, so a caller
/// can chain several mutations and commit them together.
pub struct WidgetTx<'conn> {
    tx: Transaction<'conn>,
    pub(super) config: StoreConfig,
}

/// Row image for an insert. Seeding code supplies positions directly;
/// `create` always starts unordered.
pub(super) struct NewWidget<'a> {
    pub(super) group_id: GroupId,
    pub(super) parent_id: Option<WidgetId>,
    pub(super) order: Option<u32>,
    pub(super) auto_added: bool,
    pub(super) widget_type: Option<&'a str>,
    pub(super) title: Option<&'a str>,
    pub(super) icon: Option<&'a str>,
    pub(super) visibility: Visibility,
    pub(super) view_target: Option<&'a ViewTarget>,
}

impl<'conn> WidgetTx<'conn> {
    pub(super) fn new(tx: Transaction<'conn>, config: StoreConfig) -> Self {
        Self { tx, config }
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(StoreError::Transaction)
    }

    pub fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().map_err(StoreError::Transaction)
    }

    pub fn fetch_by_id(&self, id: WidgetId) -> Result<Option<ContextWidget>, StoreError> {
        fetch_by_id(&self.tx, id)
    }

    pub fn fetch_all_for_group(&self, group_id: GroupId) -> Result<Vec<ContextWidget>, StoreError> {
        fetch_all_for_group(&self.tx, group_id)
    }

    /// Ordered widgets sharing `widget`'s group and parent, the widget included
    /// when it is ordered itself.
    pub fn fetch_siblings(&self, widget: &ContextWidget) -> Result<Vec<ContextWidget>, StoreError> {
        let sql = format!(
            "SELECT {WIDGET_COLUMNS} FROM context_widgets \
             WHERE group_id=?1 AND parent_id IS ?2 AND \"order\" IS NOT NULL \
             ORDER BY \"order\" ASC, id ASC"
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let mut rows = stmt.query(params![
            widget.group_id.get(),
            widget.parent_id.map(WidgetId::get)
        ])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_widget_row(row)?.into_widget()?);
        }
        Ok(out)
    }

    /// Writes `order` and `parent_id` for every listed row in one statement and
    /// stamps them `auto_added`.
    pub fn bulk_set_fields(&self, updates: &[WidgetPosition]) -> Result<usize, StoreError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let mut sql = String::from("UPDATE context_widgets SET \"order\" = CASE id");
        let mut values = Vec::with_capacity(updates.len() * 5 + 1);
        for update in updates {
            sql.push_str(" WHEN ? THEN ?");
            values.push(Value::Integer(update.id.get()));
            values.push(update.order.map_or(Value::Null, |order| Value::Integer(i64::from(order))));
        }
        sql.push_str(" END, parent_id = CASE id");
        for update in updates {
            sql.push_str(" WHEN ? THEN ?");
            values.push(Value::Integer(update.id.get()));
            values.push(update.parent_id.map_or(Value::Null, |parent| Value::Integer(parent.get())));
        }
        sql.push_str(" END, auto_added = 1, updated_at_ms = ? WHERE id IN (");
        values.push(Value::Integer(now_ms()));
        for (index, update) in updates.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            values.push(Value::Integer(update.id.get()));
        }
        sql.push(')');

        self.tx
            .execute(&sql, params_from_iter(values))
            .map_err(StoreError::Transaction)
    }

    /// Takes rows out of the menu in one statement.
    pub fn clear_positions(&self, ids: &[WidgetId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE context_widgets SET \"order\" = NULL, parent_id = NULL, auto_added = 1, updated_at_ms = ? \
             WHERE id IN ({placeholders})"
        );
        let mut values = Vec::with_capacity(ids.len() + 1);
        values.push(Value::Integer(now_ms()));
        values.extend(ids.iter().map(|id| Value::Integer(id.get())));

        self.tx
            .execute(&sql, params_from_iter(values))
            .map_err(StoreError::Transaction)
    }

    pub(super) fn require(&self, id: WidgetId) -> Result<ContextWidget, StoreError> {
        self.fetch_by_id(id)?.ok_or(StoreError::NotFound { id })
    }

    pub(super) fn insert_widget(&self, widget: NewWidget<'_>) -> Result<WidgetId, StoreError> {
        let now_ms = now_ms();
        let view = ViewColumns::from_target(widget.view_target);
        self.tx.execute(
            "INSERT INTO context_widgets(group_id, parent_id, \"order\", auto_added, type, title, icon, visibility, \
               view, view_post_id, view_chat_id, view_group_id, view_user_id, custom_view_id, view_track_id, \
               view_funding_round_id, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
            params![
                widget.group_id.get(),
                widget.parent_id.map(WidgetId::get),
                widget.order,
                widget.auto_added,
                widget.widget_type,
                widget.title,
                widget.icon,
                widget.visibility.as_str(),
                view.view,
                view.post,
                view.chat,
                view.group,
                view.user,
                view.custom,
                view.track,
                view.funding_round,
                now_ms,
            ],
        )?;
        WidgetId::try_new(self.tx.last_insert_rowid())
            .map_err(|_| StoreError::InvalidRow("inserted widget id is not positive"))
    }

    /// Applies non-positional field changes. `auto_added` is always written.
    pub(super) fn patch_fields(
        &self,
        id: WidgetId,
        patch: &WidgetPatch,
        auto_added: bool,
    ) -> Result<(), StoreError> {
        let mut sets = vec!["auto_added = ?", "updated_at_ms = ?"];
        let mut values = vec![Value::Integer(i64::from(auto_added)), Value::Integer(now_ms())];

        if let Some(widget_type) = patch.widget_type.as_deref() {
            sets.push("type = ?");
            values.push(optional_text(widget_type));
        }
        if let Some(title) = patch.title.as_deref() {
            sets.push("title = ?");
            values.push(optional_text(title));
        }
        if let Some(icon) = patch.icon.as_deref() {
            sets.push("icon = ?");
            values.push(optional_text(icon));
        }
        if let Some(visibility) = patch.visibility {
            sets.push("visibility = ?");
            values.push(Value::Text(visibility.as_str().to_string()));
        }
        if let Some(target) = patch.view_target.as_ref() {
            let view = ViewColumns::from_target(Some(target));
            sets.extend([
                "view = ?",
                "view_post_id = ?",
                "view_chat_id = ?",
                "view_group_id = ?",
                "view_user_id = ?",
                "custom_view_id = ?",
                "view_track_id = ?",
                "view_funding_round_id = ?",
            ]);
            values.push(view.view.map_or(Value::Null, Value::Text));
            for column in [
                view.post,
                view.chat,
                view.group,
                view.user,
                view.custom,
                view.track,
                view.funding_round,
            ] {
                values.push(column.map_or(Value::Null, Value::Integer));
            }
        }

        let sql = format!("UPDATE context_widgets SET {} WHERE id = ?", sets.join(", "));
        values.push(Value::Integer(id.get()));
        let updated = self.tx.execute(&sql, params_from_iter(values))?;
        if updated == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    pub(super) fn set_auto_added(&self, id: WidgetId, auto_added: bool) -> Result<(), StoreError> {
        self.tx.execute(
            "UPDATE context_widgets SET auto_added = ?1 WHERE id = ?2",
            params![auto_added, id.get()],
        )?;
        Ok(())
    }
}

pub(super) fn fetch_by_id(conn: &Connection, id: WidgetId) -> Result<Option<ContextWidget>, StoreError> {
    let sql = format!("SELECT {WIDGET_COLUMNS} FROM context_widgets WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id.get()], parse_widget_row)
        .optional()?;
    raw.map(RawWidget::into_widget).transpose()
}

pub(super) fn fetch_all_for_group(
    conn: &Connection,
    group_id: GroupId,
) -> Result<Vec<ContextWidget>, StoreError> {
    let sql = format!(
        "SELECT {WIDGET_COLUMNS} FROM context_widgets WHERE group_id = ?1 \
         ORDER BY created_at_ms ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![group_id.get()])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(parse_widget_row(row)?.into_widget()?);
    }
    Ok(out)
}

fn optional_text(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Text(trimmed.to_string())
    }
}

#[derive(Default)]
struct ViewColumns {
    view: Option<String>,
    post: Option<i64>,
    chat: Option<i64>,
    group: Option<i64>,
    user: Option<i64>,
    custom: Option<i64>,
    track: Option<i64>,
    funding_round: Option<i64>,
}

impl ViewColumns {
    fn from_target(target: Option<&ViewTarget>) -> Self {
        let mut columns = Self::default();
        match target {
            None => {}
            Some(ViewTarget::View(name)) => columns.view = Some(name.clone()),
            Some(ViewTarget::Post(id)) => columns.post = Some(*id),
            Some(ViewTarget::Chat(id)) => columns.chat = Some(*id),
            Some(ViewTarget::Group(id)) => columns.group = Some(*id),
            Some(ViewTarget::User(id)) => columns.user = Some(*id),
            Some(ViewTarget::CustomView(id)) => columns.custom = Some(*id),
            Some(ViewTarget::Track(id)) => columns.track = Some(*id),
            Some(ViewTarget::FundingRound(id)) => columns.funding_round = Some(*id),
        }
        columns
    }

    /// Entity columns win over the `view` name, matching the order they are loaded in.
    fn into_target(self) -> Option<ViewTarget> {
        self.post
            .map(ViewTarget::Post)
            .or(self.chat.map(ViewTarget::Chat))
            .or(self.group.map(ViewTarget::Group))
            .or(self.user.map(ViewTarget::User))
            .or(self.custom.map(ViewTarget::CustomView))
            .or(self.track.map(ViewTarget::Track))
            .or(self.funding_round.map(ViewTarget::FundingRound))
            .or(self.view.map(ViewTarget::View))
    }
}

struct RawWidget {
    id: i64,
    group_id: i64,
    parent_id: Option<i64>,
    order: Option<i64>,
    auto_added: bool,
    widget_type: Option<String>,
    title: Option<String>,
    icon: Option<String>,
    visibility: String,
    view: ViewColumns,
    created_at_ms: i64,
    updated_at_ms: i64,
}

fn parse_widget_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWidget> {
    Ok(RawWidget {
        id: row.get(0)?,
        group_id: row.get(1)?,
        parent_id: row.get(2)?,
        order: row.get(3)?,
        auto_added: row.get(4)?,
        widget_type: row.get(5)?,
        title: row.get(6)?,
        icon: row.get(7)?,
        visibility: row.get(8)?,
        view: ViewColumns {
            view: row.get(9)?,
            post: row.get(10)?,
            chat: row.get(11)?,
            group: row.get(12)?,
            user: row.get(13)?,
            custom: row.get(14)?,
            track: row.get(15)?,
            funding_round: row.get(16)?,
        },
        created_at_ms: row.get(17)?,
        updated_at_ms: row.get(18)?,
    })
}

impl RawWidget {
    fn into_widget(self) -> Result<ContextWidget, StoreError> {
        let id = WidgetId::try_new(self.id).map_err(|_| StoreError::InvalidRow("widget id"))?;
        let group_id =
            GroupId::try_new(self.group_id).map_err(|_| StoreError::InvalidRow("group_id"))?;
        let parent_id = self
            .parent_id
            .map(WidgetId::try_new)
            .transpose()
            .map_err(|_| StoreError::InvalidRow("parent_id"))?;
        let order = self
            .order
            .map(u32::try_from)
            .transpose()
            .map_err(|_| StoreError::InvalidRow("order"))?;
        let visibility =
            Visibility::parse(&self.visibility).ok_or(StoreError::InvalidRow("visibility"))?;

        Ok(ContextWidget {
            id,
            group_id,
            parent_id,
            order,
            auto_added: self.auto_added,
            widget_type: self.widget_type,
            title: self.title,
            icon: self.icon,
            visibility,
            view_target: self.view.into_target(),
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        })
    }
}
