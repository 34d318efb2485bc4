#![forbid(unsafe_code)]

mod error;
mod menu_setup;
mod mutations;
mod requests;
mod widgets;

pub use error::StoreError;
pub use menu_setup::*;
pub use requests::*;
pub use widgets::WidgetTx;

use cw_core::ids::{GroupId, WidgetId};
use cw_core::model::ContextWidget;
use cw_core::tree::{DensityViolation, MenuNode, build_menu, check_density};
use rusqlite::{Connection, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "context_widgets.db";
const SCHEMA_VERSION: i64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub busy_timeout: Duration,
    /// When set, `update` marks the widget as manually placed (`auto_added = false`)
    /// instead of stamping `auto_added = true`.
    pub manual_updates_clear_auto_added: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            manual_updates_clear_auto_added: false,
        }
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(storage_dir, StoreConfig::default())
    }

    pub fn open_with_config(
        storage_dir: impl AsRef<Path>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE_NAME))?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        install_schema(&conn)?;

        Ok(Self {
            conn,
            storage_dir,
            config,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Opens a write transaction. SQLite takes the database write lock up front,
    /// so a read-compute-write sequence cannot interleave with another writer.
    /// Dropping the handle without `commit` rolls everything back.
    pub fn begin(&mut self) -> Result<WidgetTx<'_>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(WidgetTx::new(tx, self.config))
    }

    fn with_tx<T>(
        &mut self,
        work: impl FnOnce(&WidgetTx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.begin()?;
        let out = work(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn create(&mut self, request: CreateWidgetRequest) -> Result<ContextWidget, StoreError> {
        self.with_tx(|tx| tx.create(request))
    }

    pub fn reorder(&mut self, request: ReorderWidgetRequest) -> Result<ContextWidget, StoreError> {
        self.with_tx(|tx| tx.reorder(request))
    }

    pub fn update(&mut self, request: UpdateWidgetRequest) -> Result<ContextWidget, StoreError> {
        self.with_tx(|tx| tx.update(request))
    }

    pub fn remove_from_menu(&mut self, id: WidgetId) -> Result<ContextWidget, StoreError> {
        self.with_tx(|tx| tx.remove_from_menu(id))
    }

    pub fn set_home_widget(
        &mut self,
        request: SetHomeWidgetRequest,
    ) -> Result<ContextWidget, StoreError> {
        self.with_tx(|tx| tx.set_home_widget(request))
    }

    pub fn setup_default_menu(
        &mut self,
        group_id: GroupId,
        home_view: HomeView,
        general_chat_id: i64,
    ) -> Result<bool, StoreError> {
        self.with_tx(|tx| tx.setup_default_menu(group_id, home_view, general_chat_id))
    }

    pub fn backfill_auto_view(
        &mut self,
        group_id: GroupId,
        present: &[AutoViewSlot],
    ) -> Result<BackfillReport, StoreError> {
        self.with_tx(|tx| tx.backfill_auto_view(group_id, present))
    }

    pub fn widget(&self, id: WidgetId) -> Result<Option<ContextWidget>, StoreError> {
        widgets::fetch_by_id(&self.conn, id)
    }

    pub fn widgets_for_group(&self, group_id: GroupId) -> Result<Vec<ContextWidget>, StoreError> {
        widgets::fetch_all_for_group(&self.conn, group_id)
    }

    pub fn menu(&self, group_id: GroupId) -> Result<Vec<MenuNode>, StoreError> {
        Ok(build_menu(self.widgets_for_group(group_id)?))
    }

    /// First sibling group of `group_id` that is not numbered `1..N`, if any.
    pub fn check_menu(&self, group_id: GroupId) -> Result<Option<DensityViolation>, StoreError> {
        let positions = self
            .widgets_for_group(group_id)?
            .iter()
            .map(ContextWidget::position)
            .collect::<Vec<_>>();
        Ok(check_density(&positions).err())
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS context_widgets (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          group_id INTEGER NOT NULL CHECK(group_id > 0),
          parent_id INTEGER REFERENCES context_widgets(id) ON DELETE SET NULL,
          "order" INTEGER CHECK("order" IS NULL OR "order" > 0),
          auto_added INTEGER NOT NULL DEFAULT 0,
          type TEXT,
          title TEXT,
          icon TEXT,
          visibility TEXT NOT NULL DEFAULT 'all',
          view TEXT,
          view_post_id INTEGER,
          view_chat_id INTEGER,
          view_group_id INTEGER,
          view_user_id INTEGER,
          custom_view_id INTEGER,
          view_track_id INTEGER,
          view_funding_round_id INTEGER,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          CHECK(parent_id IS NULL OR parent_id <> id)
        );

        CREATE INDEX IF NOT EXISTS idx_context_widgets_group_parent_order
          ON context_widgets(group_id, parent_id, "order");
        "#,
    )?;

    let now_ms = now_ms();
    conn.execute(
        "INSERT INTO store_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;

    Ok(())
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
