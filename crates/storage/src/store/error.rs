#![forbid(unsafe_code)]

use cw_core::ids::WidgetId;
use cw_core::tree::TreeError;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    NotFound { id: WidgetId },
    Validation(&'static str),
    /// A batched position write or the commit failed; the transaction is rolled back.
    Transaction(rusqlite::Error),
    InvalidRow(&'static str),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::NotFound { id } => write!(f, "context widget not found (id={id})"),
            Self::Validation(message) => write!(f, "validation: {message}"),
            Self::Transaction(err) => write!(f, "transaction aborted: {err}"),
            Self::InvalidRow(message) => write!(f, "invalid row: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::UnknownWidget(id) => Self::NotFound { id },
            other => Self::Validation(other.message()),
        }
    }
}
