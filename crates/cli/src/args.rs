#![forbid(unsafe_code)]

use crate::defaults::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_LOG_FILTER, default_storage_dir};
use cw_core::ids::{GroupId, WidgetId, parse_group_id, parse_widget_id};
use cw_core::model::{ViewTarget, Visibility};
use cw_core::tree::{ParentTarget, Placement};
use cw_storage::{AutoViewSlot, HomeView, PositionHint, StoreConfig, WidgetPatch};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct CliConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) store: StoreConfig,
    pub(crate) log_filter: String,
    pub(crate) command: Command,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NewWidgetArgs {
    pub(crate) group_id: GroupId,
    pub(crate) widget_type: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) visibility: Visibility,
    pub(crate) view_target: Option<ViewTarget>,
    pub(crate) position: Option<PositionHint>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Create(NewWidgetArgs),
    Update {
        id: WidgetId,
        patch: WidgetPatch,
        position: Option<PositionHint>,
    },
    Reorder {
        id: WidgetId,
        position: PositionHint,
    },
    Remove {
        id: WidgetId,
    },
    SetHome {
        group_id: GroupId,
        id: WidgetId,
    },
    Show {
        id: WidgetId,
    },
    List {
        group_id: GroupId,
    },
    Tree {
        group_id: GroupId,
    },
    Check {
        group_id: GroupId,
    },
    SetupMenu {
        group_id: GroupId,
        home_view: HomeView,
        general_chat_id: i64,
    },
    Backfill {
        group_id: GroupId,
        slots: Vec<AutoViewSlot>,
    },
}

pub(crate) fn usage() -> &'static str {
    "cw: maintain context widget menus\n\n\
USAGE:\n\
  cw [--storage-dir DIR] [--busy-timeout-ms MS] [--manual-clears-auto-added]\n\
     [--log FILTER] <COMMAND> [ARGS]\n\n\
COMMANDS:\n\
  create     --group N [--type T] [--title T] [--icon I] [--visibility all|admin]\n\
             [--view KIND:VALUE] [--parent ID|root] [--in-front-of ID] [--add-to-end]\n\
  update     --id N [same field and position flags as create]\n\
  reorder    --id N [--parent ID|root] [--in-front-of ID] [--add-to-end]\n\
  remove     --id N\n\
  set-home   --group N --id N\n\
  show       --id N\n\
  list       --group N\n\
  tree       --group N\n\
  check      --group N\n\
  setup-menu --group N --general-chat N [--home-view chat|stream|map]\n\
  backfill   --group N [--slots stream,events,...]\n\n\
ENV:\n\
  CW_STORAGE_DIR, CW_BUSY_TIMEOUT_MS, CW_MANUAL_CLEARS_AUTO_ADDED, CW_LOG (or RUST_LOG)\n\n\
NOTES:\n\
  - KIND is one of post, chat, group, user, custom, track, funding-round, view.\n\
  - without any position flag `create` leaves the widget out of the menu.\n\
  - output is JSON on stdout; logs go to stderr.\n"
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_args() -> Result<CliConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }
    parse_args_from(&args, env_var)
}

/// Flags collected before the command is assembled.
#[derive(Default)]
struct RawArgs {
    command: Option<String>,
    group: Option<GroupId>,
    id: Option<WidgetId>,
    widget_type: Option<String>,
    title: Option<String>,
    icon: Option<String>,
    visibility: Option<Visibility>,
    view_target: Option<ViewTarget>,
    parent: Option<ParentTarget>,
    in_front_of: Option<WidgetId>,
    add_to_end: bool,
    home_view: Option<HomeView>,
    general_chat: Option<i64>,
    slots: Option<Vec<AutoViewSlot>>,
}

pub(crate) fn parse_args_from(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<CliConfig, String> {
    let mut storage_dir: Option<PathBuf> = env("CW_STORAGE_DIR").map(PathBuf::from);
    let mut busy_timeout_ms: u64 = match env("CW_BUSY_TIMEOUT_MS") {
        Some(v) => v
            .parse()
            .map_err(|_| "CW_BUSY_TIMEOUT_MS must be an integer (milliseconds)")?,
        None => DEFAULT_BUSY_TIMEOUT_MS,
    };
    let mut manual_clears_auto_added = match env("CW_MANUAL_CLEARS_AUTO_ADDED") {
        Some(v) => parse_flag(&v)
            .ok_or("CW_MANUAL_CLEARS_AUTO_ADDED must be one of 1, 0, true, false")?,
        None => false,
    };
    let mut log_filter: Option<String> = env("CW_LOG").or_else(|| env("RUST_LOG"));
    let mut raw = RawArgs::default();

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--busy-timeout-ms" => {
                i += 1;
                let v = args.get(i).ok_or("--busy-timeout-ms requires MS")?;
                busy_timeout_ms = v
                    .parse::<u64>()
                    .map_err(|_| "--busy-timeout-ms must be an integer (milliseconds)")?;
            }
            "--manual-clears-auto-added" => manual_clears_auto_added = true,
            "--log" => {
                i += 1;
                let v = args.get(i).ok_or("--log requires FILTER")?;
                log_filter = Some(v.to_string());
            }
            "--group" => {
                i += 1;
                let v = args.get(i).ok_or("--group requires N")?;
                raw.group = Some(parse_group_id(v).map_err(|e| format!("--group: {}", e.message()))?);
            }
            "--id" => {
                i += 1;
                let v = args.get(i).ok_or("--id requires N")?;
                raw.id = Some(parse_widget_id(v).map_err(|e| format!("--id: {}", e.message()))?);
            }
            "--type" => {
                i += 1;
                let v = args.get(i).ok_or("--type requires T")?;
                raw.widget_type = Some(v.to_string());
            }
            "--title" => {
                i += 1;
                let v = args.get(i).ok_or("--title requires T")?;
                raw.title = Some(v.to_string());
            }
            "--icon" => {
                i += 1;
                let v = args.get(i).ok_or("--icon requires I")?;
                raw.icon = Some(v.to_string());
            }
            "--visibility" => {
                i += 1;
                let v = args.get(i).ok_or("--visibility requires all|admin")?;
                raw.visibility =
                    Some(Visibility::parse(v).ok_or("--visibility must be all or admin")?);
            }
            "--view" => {
                i += 1;
                let v = args.get(i).ok_or("--view requires KIND:VALUE")?;
                raw.view_target =
                    Some(ViewTarget::parse(v).map_err(|e| format!("--view: {}", e.message()))?);
            }
            "--parent" => {
                i += 1;
                let v = args.get(i).ok_or("--parent requires ID|root")?;
                raw.parent = Some(if v.trim() == "root" {
                    ParentTarget::Root
                } else {
                    ParentTarget::Under(
                        parse_widget_id(v).map_err(|e| format!("--parent: {}", e.message()))?,
                    )
                });
            }
            "--in-front-of" => {
                i += 1;
                let v = args.get(i).ok_or("--in-front-of requires ID")?;
                raw.in_front_of = Some(
                    parse_widget_id(v).map_err(|e| format!("--in-front-of: {}", e.message()))?,
                );
            }
            "--add-to-end" => raw.add_to_end = true,
            "--home-view" => {
                i += 1;
                let v = args.get(i).ok_or("--home-view requires chat|stream|map")?;
                raw.home_view =
                    Some(HomeView::parse(v).ok_or("--home-view must be chat, stream or map")?);
            }
            "--general-chat" => {
                i += 1;
                let v = args.get(i).ok_or("--general-chat requires N")?;
                raw.general_chat = Some(
                    v.parse::<i64>()
                        .ok()
                        .filter(|id| *id > 0)
                        .ok_or("--general-chat must be a positive integer")?,
                );
            }
            "--slots" => {
                i += 1;
                let v = args.get(i).ok_or("--slots requires a comma-separated list")?;
                raw.slots = Some(parse_slots(v)?);
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown arg: {other}\n\n{}", usage()));
            }
            other => {
                if let Some(existing) = raw.command.as_deref() {
                    return Err(format!("unexpected argument {other} after command {existing}"));
                }
                raw.command = Some(other.to_string());
            }
        }
        i += 1;
    }

    let command = build_command(raw)?;
    Ok(CliConfig {
        storage_dir: storage_dir.unwrap_or_else(default_storage_dir),
        store: StoreConfig {
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            manual_updates_clear_auto_added: manual_clears_auto_added,
        },
        log_filter: log_filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        command,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_slots(raw: &str) -> Result<Vec<AutoViewSlot>, String> {
    let mut slots = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let slot = AutoViewSlot::parse(name).ok_or_else(|| format!("unknown slot: {name}"))?;
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }
    Ok(slots)
}

fn position_hint(raw: &RawArgs) -> Result<Option<PositionHint>, String> {
    let placement = match (raw.in_front_of, raw.add_to_end) {
        (Some(_), true) => return Err("--in-front-of and --add-to-end are exclusive".to_string()),
        (Some(reference), false) => Some(Placement::InFrontOf(reference)),
        (None, true) => Some(Placement::AddToEnd),
        (None, false) => None,
    };
    if placement.is_none() && raw.parent.is_none() {
        return Ok(None);
    }
    Ok(Some(PositionHint {
        parent: raw.parent.unwrap_or_default(),
        placement,
    }))
}

fn build_command(raw: RawArgs) -> Result<Command, String> {
    let name = raw
        .command
        .clone()
        .ok_or_else(|| format!("missing command\n\n{}", usage()))?;
    let group = || raw.group.ok_or(format!("{name} requires --group N"));
    let id = || raw.id.ok_or(format!("{name} requires --id N"));

    let command = match name.as_str() {
        "create" => Command::Create(NewWidgetArgs {
            group_id: group()?,
            widget_type: raw.widget_type.clone(),
            title: raw.title.clone(),
            icon: raw.icon.clone(),
            visibility: raw.visibility.unwrap_or_default(),
            view_target: raw.view_target.clone(),
            position: position_hint(&raw)?,
        }),
        "update" => Command::Update {
            id: id()?,
            patch: WidgetPatch {
                widget_type: raw.widget_type.clone(),
                title: raw.title.clone(),
                icon: raw.icon.clone(),
                visibility: raw.visibility,
                view_target: raw.view_target.clone(),
            },
            position: position_hint(&raw)?,
        },
        "reorder" => Command::Reorder {
            id: id()?,
            position: position_hint(&raw)?.unwrap_or_default(),
        },
        "remove" => Command::Remove { id: id()? },
        "set-home" => Command::SetHome {
            group_id: group()?,
            id: id()?,
        },
        "show" => Command::Show { id: id()? },
        "list" => Command::List { group_id: group()? },
        "tree" => Command::Tree { group_id: group()? },
        "check" => Command::Check { group_id: group()? },
        "setup-menu" => Command::SetupMenu {
            group_id: group()?,
            home_view: raw.home_view.unwrap_or_default(),
            general_chat_id: raw
                .general_chat
                .ok_or("setup-menu requires --general-chat N")?,
        },
        "backfill" => Command::Backfill {
            group_id: group()?,
            slots: raw.slots.clone().unwrap_or_default(),
        },
        other => return Err(format!("Unknown command: {other}\n\n{}", usage())),
    };
    Ok(command)
}
