//! Connection setup and schema ladder for the note store.
//!
//! Connections handed out by [`open_db`] enforce foreign keys and carry the
//! full `notes`/`tags`/`note_tags` schema.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening a store or checking its schema.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer zettel build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "note store schema v{db_version} is newer than this build (v{latest_supported})"
            ),
            Self::MissingTable(table) => write!(f, "note store has no `{table}` table"),
            Self::MissingColumn { table, column } => {
                write!(f, "note store table `{table}` lacks column `{column}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
