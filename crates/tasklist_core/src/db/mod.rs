//! SQLite bootstrap for the task store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for task persistence.
//! - Apply schema migrations before any task data is touched.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is never opened for writing.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening, migrating or talking to SQLite.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The connection was not bootstrapped through [`open_db`] or [`open_db_in_memory`].
    SchemaNotApplied {
        table: &'static str,
    },
    /// Another writer on the same connection holds an open transaction.
    TransactionInUse,
    /// The transaction holding staged changes was ended by someone else.
    TransactionLost,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "task database schema {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotApplied { table } => {
                write!(f, "table `{table}` is missing; migrations were not applied")
            }
            Self::TransactionInUse => {
                write!(f, "connection already has a transaction owned by another store")
            }
            Self::TransactionLost => {
                write!(f, "staged changes were rolled back outside this store")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::SchemaNotApplied { .. }
            | Self::TransactionInUse
            | Self::TransactionLost => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
