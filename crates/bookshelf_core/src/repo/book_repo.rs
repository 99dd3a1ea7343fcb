//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide atomic CRUD over the `books` table.
//! - Execute filtered, windowed listings together with their total count.
//!
//! # Invariants
//! - `create_book`/`update_book` validate before writing; a rejected write
//!   persists nothing.
//! - `update_book` merges only supplied fields; the last write wins.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::book::{Book, BookId, BookPatch, BookValidationError, NewBook};
use crate::search::filter::{register_fold_function, BookFilter};
use crate::search::page::PageRequest;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BOOK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    author,
    genre,
    year,
    created_at
FROM books";

const BOOK_COLUMNS: &[&str] = &[
    "uuid",
    "title",
    "author",
    "genre",
    "year",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Submitted fields violate the book rules. Nothing was written.
    Validation(BookValidationError),
    Db(DbError),
    NotFound(BookId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookValidationError> for RepoError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing options: which books, and which window of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    pub filter: BookFilter,
    /// `None` returns every row after `offset`.
    pub limit: Option<u32>,
    pub offset: u64,
}

impl BookListQuery {
    /// Builds a query for one listing page.
    pub fn page(filter: BookFilter, request: PageRequest) -> Self {
        Self {
            filter,
            limit: Some(request.limit()),
            offset: request.offset(),
        }
    }
}

/// One window of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPage {
    /// Books inside the requested window, oldest first.
    pub books: Vec<Book>,
    /// Number of books matching the filter, ignoring the window.
    pub total_count: u64,
}

/// Repository interface for book CRUD operations.
pub trait BookRepository {
    fn create_book(&self, book: &NewBook) -> RepoResult<Book>;
    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<Book>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<BookPage>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections whose schema version or `books` shape does not
    /// match this binary.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        register_fold_function(conn)?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &NewBook) -> RepoResult<Book> {
        book.validate()?;

        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            year: book.year,
            created_at: Utc::now().timestamp_millis(),
        };

        self.conn.execute(
            "INSERT INTO books (
                uuid,
                title,
                author,
                genre,
                year,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                created.id.to_string(),
                created.title.as_str(),
                created.author.as_str(),
                created.genre.as_deref(),
                created.year,
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<Book> {
        let tx = self.conn.unchecked_transaction()?;

        let mut book = load_book(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        book.apply_patch(patch);
        book.validate()?;

        let changed = tx.execute(
            "UPDATE books
             SET
                title = ?1,
                author = ?2,
                genre = ?3,
                year = ?4,
                updated_at = ?5
             WHERE uuid = ?6;",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.genre.as_deref(),
                book.year,
                Utc::now().timestamp_millis(),
                id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(book)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<BookPage> {
        let (clause, filter_binds) = query.filter.to_sql();
        let tx = self.conn.unchecked_transaction()?;

        let total_count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM books WHERE {clause};"),
            params_from_iter(filter_binds.iter()),
            |row| row.get(0),
        )?;

        let mut bind_values = filter_binds;
        bind_values.push(Value::Integer(query.limit.map_or(-1, i64::from)));
        bind_values.push(Value::Integer(
            i64::try_from(query.offset).unwrap_or(i64::MAX),
        ));

        let books = {
            let mut stmt = tx.prepare(&format!(
                "{BOOK_SELECT_SQL}
                 WHERE {clause}
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ? OFFSET ?;"
            ))?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut books = Vec::new();
            while let Some(row) = rows.next()? {
                books.push(parse_book_row(row)?);
            }
            books
        };
        tx.commit()?;

        Ok(BookPage {
            books,
            total_count: u64::try_from(total_count).map_err(|_| {
                RepoError::InvalidData(format!("negative book count `{total_count}`"))
            })?,
        })
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn load_book(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_book_row(row)?)),
        None => Ok(None),
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in books.uuid"))
    })?;

    let book = Book {
        id,
        title: row.get("title")?,
        author: row.get("author")?,
        genre: row.get("genre")?,
        year: row.get("year")?,
        created_at: row.get("created_at")?,
    };
    // A stored row that breaks the field rules is corrupt data, not user error.
    book.validate()
        .map_err(|err| RepoError::InvalidData(format!("book {id}: {err}")))?;
    Ok(book)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "books")? {
        return Err(RepoError::MissingRequiredTable("books"));
    }

    let present = table_columns(conn, "books")?;
    if let Some(column) = BOOK_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name.as_str() == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: "books",
            column,
        });
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
