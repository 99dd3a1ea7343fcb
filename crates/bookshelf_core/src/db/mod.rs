//! Book store bootstrap.
//!
//! Everything that touches a raw `rusqlite::Connection` before a
//! [`crate::repo::book_repo::SqliteBookRepository`] is built lives here:
//! opening files, connection pragmas, the search SQL function and schema
//! upgrades.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A file stamped by a newer build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// SQLite refused to open, configure or migrate the database.
    Sqlite(rusqlite::Error),
    /// The file was migrated past what this build knows how to read.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "book store: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "book store schema v{found} is newer than this build (up to v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
