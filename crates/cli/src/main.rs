#![forbid(unsafe_code)]

mod args;
mod defaults;
mod output;

use args::{CliConfig, Command, parse_args};
use cw_storage::{
    CreateWidgetRequest, ReorderWidgetRequest, SetHomeWidgetRequest, SqliteStore, StoreError,
    UpdateWidgetRequest,
};
use output::{BackfillJson, CheckJson, MenuNodeJson, SetupJson, WidgetJson, print_json};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Store(StoreError),
    Output(serde_json::Error),
    MissingWidget(i64),
    NotDense,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "output: {err}"),
            Self::MissingWidget(id) => write!(f, "context widget not found (id={id})"),
            Self::NotDense => write!(f, "menu has a sibling group that is not numbered 1..N"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Store(StoreError::NotFound { .. }) | Self::MissingWidget(_) => 3,
            Self::Store(StoreError::Validation(_)) => 4,
            Self::NotDense => 5,
            Self::Store(_) | Self::Output(_) => 1,
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cfg: CliConfig) -> Result<(), CliError> {
    let mut store = SqliteStore::open_with_config(&cfg.storage_dir, cfg.store)?;
    debug!(storage_dir = %cfg.storage_dir.display(), "opened store");

    match cfg.command {
        Command::Create(new) => {
            let widget = store.create(CreateWidgetRequest {
                group_id: new.group_id,
                widget_type: new.widget_type,
                title: new.title,
                icon: new.icon,
                visibility: new.visibility,
                view_target: new.view_target,
                position: new.position,
            })?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::Update {
            id,
            patch,
            position,
        } => {
            let widget = store.update(UpdateWidgetRequest { id, patch, position })?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::Reorder { id, position } => {
            let widget = store.reorder(ReorderWidgetRequest {
                id,
                parent: position.parent,
                placement: position.placement,
            })?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::Remove { id } => {
            let widget = store.remove_from_menu(id)?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::SetHome { group_id, id } => {
            let widget = store.set_home_widget(SetHomeWidgetRequest {
                group_id,
                widget_id: id,
            })?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::Show { id } => {
            let widget = store.widget(id)?.ok_or(CliError::MissingWidget(id.get()))?;
            print_json(&WidgetJson::from(&widget))?;
        }
        Command::List { group_id } => {
            let widgets = store.widgets_for_group(group_id)?;
            print_json(&widgets.iter().map(WidgetJson::from).collect::<Vec<_>>())?;
        }
        Command::Tree { group_id } => {
            let menu = store.menu(group_id)?;
            print_json(&menu.iter().map(MenuNodeJson::from).collect::<Vec<_>>())?;
        }
        Command::Check { group_id } => {
            let violation = store.check_menu(group_id)?;
            print_json(&CheckJson::from(violation.as_ref()))?;
            if violation.is_some() {
                return Err(CliError::NotDense);
            }
        }
        Command::SetupMenu {
            group_id,
            home_view,
            general_chat_id,
        } => {
            let created = store.setup_default_menu(group_id, home_view, general_chat_id)?;
            print_json(&SetupJson {
                group_id: group_id.get(),
                created,
            })?;
        }
        Command::Backfill { group_id, slots } => {
            let report = store.backfill_auto_view(group_id, &slots)?;
            print_json(&BackfillJson::from(&report))?;
        }
    }
    Ok(())
}

fn main() {
    let cfg = parse_args().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(2);
    });
    init_tracing(&cfg.log_filter);

    if let Err(err) = run(cfg) {
        error!(%err, "command failed");
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
