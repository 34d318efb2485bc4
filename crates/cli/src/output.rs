#![forbid(unsafe_code)]

use cw_core::model::ContextWidget;
use cw_core::tree::{DensityViolation, MenuNode};
use cw_storage::BackfillReport;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct WidgetJson {
    id: i64,
    group_id: i64,
    parent_id: Option<i64>,
    order: Option<u32>,
    auto_added: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    widget_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    visibility: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<String>,
    created_at_ms: i64,
    updated_at_ms: i64,
}

impl From<&ContextWidget> for WidgetJson {
    fn from(widget: &ContextWidget) -> Self {
        Self {
            id: widget.id.get(),
            group_id: widget.group_id.get(),
            parent_id: widget.parent_id.map(|id| id.get()),
            order: widget.order,
            auto_added: widget.auto_added,
            widget_type: widget.widget_type.clone(),
            title: widget.title.clone(),
            icon: widget.icon.clone(),
            visibility: widget.visibility.as_str(),
            view: widget.view_target.as_ref().map(|target| target.to_string()),
            created_at_ms: widget.created_at_ms,
            updated_at_ms: widget.updated_at_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MenuNodeJson {
    #[serde(flatten)]
    widget: WidgetJson,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<MenuNodeJson>,
}

impl From<&MenuNode> for MenuNodeJson {
    fn from(node: &MenuNode) -> Self {
        Self {
            widget: WidgetJson::from(&node.widget),
            children: node.children.iter().map(MenuNodeJson::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckJson {
    dense: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    violation: Option<ViolationJson>,
}

#[derive(Debug, Serialize)]
struct ViolationJson {
    parent_id: Option<i64>,
    orders: Vec<u32>,
    message: String,
}

impl From<Option<&DensityViolation>> for CheckJson {
    fn from(violation: Option<&DensityViolation>) -> Self {
        Self {
            dense: violation.is_none(),
            violation: violation.map(|violation| ViolationJson {
                parent_id: violation.parent_id.map(|id| id.get()),
                orders: violation.orders.clone(),
                message: violation.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SetupJson {
    pub(crate) group_id: i64,
    pub(crate) created: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct BackfillJson {
    resources_created: bool,
    placed: Vec<i64>,
}

impl From<&BackfillReport> for BackfillJson {
    fn from(report: &BackfillReport) -> Self {
        Self {
            resources_created: report.resources_created,
            placed: report.placed.iter().map(|id| id.get()).collect(),
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
