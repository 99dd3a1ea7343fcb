//! Core domain logic for Bookshelf.
//! This crate is the single source of truth for book listing and write
//! validation rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{BookshelfConfig, ConfigError};
pub use logging::{default_log_level, flush_logging, init_logging, logging_status};
pub use model::book::{
    Book, BookField, BookId, BookInput, BookPatch, BookValidationError, FieldViolation, NewBook,
    BOOK_FIELD_RULES,
};
pub use repo::book_repo::{
    BookListQuery, BookPage, BookRepository, RepoError, RepoResult, SqliteBookRepository,
};
pub use search::filter::BookFilter;
pub use search::page::{parse_page, total_pages, PageInfo, PageRequest, PAGE_SIZE};
pub use service::book_service::{
    BookForm, BookListing, BookService, BookServiceError, FormMode, WriteOutcome,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
