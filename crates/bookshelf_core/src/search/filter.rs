//! Free-text book filter.
//!
//! # Invariants
//! - A blank or absent term matches every book.
//! - A term matches when it is a substring of `title`, `author`, `genre` or
//!   the decimal form of `year`, compared case-insensitively.
//! - The in-memory predicate and the SQL clause accept the same books.
//! - Case folding is Unicode lowercase on both sides, so `%` and `_` are
//!   plain characters.

use crate::model::book::Book;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::Connection;

/// SQL scalar function applying [`fold_case`] to one text argument.
pub(crate) const FOLD_FUNCTION: &str = "bookshelf_fold";

/// Columns searched by a free-text term, in SQL form.
const SEARCH_COLUMNS: &[&str] = &["title", "author", "genre", "CAST(year AS TEXT)"];

/// Filter predicate over books.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookFilter {
    /// Accepts every book.
    #[default]
    MatchAll,
    /// Accepts books containing the term in any searched field.
    Contains(String),
}

impl BookFilter {
    /// Builds a filter from an optional search term.
    ///
    /// The term is used verbatim; only an empty term means match-all.
    pub fn from_search(search: Option<&str>) -> Self {
        match search {
            Some(term) if !term.is_empty() => Self::Contains(term.to_string()),
            _ => Self::MatchAll,
        }
    }

    /// Returns the search term, if any.
    pub fn term(&self) -> Option<&str> {
        match self {
            Self::MatchAll => None,
            Self::Contains(term) => Some(term.as_str()),
        }
    }

    /// Evaluates this filter against one book.
    pub fn matches(&self, book: &Book) -> bool {
        let Self::Contains(term) = self else {
            return true;
        };
        let needle = fold_case(term);
        let contains = |haystack: &str| fold_case(haystack).contains(&needle);

        contains(book.title.as_str())
            || contains(book.author.as_str())
            || book.genre.as_deref().is_some_and(contains)
            || book.year.is_some_and(|year| contains(year.to_string().as_str()))
    }

    /// Renders the filter as a SQL boolean expression plus bind values.
    ///
    /// Uses positional `?` placeholders and needs [`register_fold_function`]
    /// on the executing connection.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let Self::Contains(term) = self else {
            return ("1 = 1".to_string(), Vec::new());
        };

        let needle = fold_case(term);
        let clause = SEARCH_COLUMNS
            .iter()
            .map(|column| format!("instr({FOLD_FUNCTION}({column}), ?) > 0"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let binds = SEARCH_COLUMNS
            .iter()
            .map(|_| Value::Text(needle.clone()))
            .collect();

        (format!("({clause})"), binds)
    }
}

/// Unicode lowercase folding shared by SQL and in-memory matching.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Registers [`FOLD_FUNCTION`] on `conn`. Re-registering replaces it.
pub(crate) fn register_fold_function(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.as_deref().map(fold_case))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{fold_case, register_fold_function, BookFilter, FOLD_FUNCTION};
    use crate::model::book::Book;
    use uuid::Uuid;

    fn dune() -> Book {
        Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: Some("Sci-Fi".to_string()),
            year: Some(1965),
            created_at: 0,
        }
    }

    #[test]
    fn absent_or_empty_term_matches_all() {
        assert_eq!(BookFilter::from_search(None), BookFilter::MatchAll);
        assert_eq!(BookFilter::from_search(Some("")), BookFilter::MatchAll);
        assert!(BookFilter::MatchAll.matches(&dune()));
    }

    #[test]
    fn term_matches_any_searched_field_case_insensitively() {
        let book = dune();
        for term in ["dUNE", "herb", "sci-fi", "196"] {
            assert!(
                BookFilter::from_search(Some(term)).matches(&book),
                "term `{term}` should match"
            );
        }
        assert!(!BookFilter::from_search(Some("nomatch")).matches(&book));
    }

    #[test]
    fn missing_optional_fields_never_match() {
        let mut book = dune();
        book.genre = None;
        book.year = None;
        assert!(!BookFilter::from_search(Some("sci")).matches(&book));
        assert!(!BookFilter::from_search(Some("1965")).matches(&book));
    }

    #[test]
    fn non_ascii_letters_fold_both_ways() {
        let mut book = dune();
        book.title = "Éclair Stories".to_string();
        book.author = "Zoë".to_string();
        for term in ["éclair", "ÉCLAIR", "zoë", "ZOË"] {
            assert!(
                BookFilter::from_search(Some(term)).matches(&book),
                "term `{term}` should match"
            );
        }
    }

    #[test]
    fn sql_clause_binds_folded_term_per_column() {
        let (clause, binds) = BookFilter::from_search(Some("50%_É")).to_sql();
        assert_eq!(clause.matches("instr(").count(), 4);
        assert_eq!(binds.len(), 4);
        assert_eq!(
            binds[0],
            rusqlite::types::Value::Text("50%_é".to_string())
        );
    }

    #[test]
    fn registered_fold_function_matches_rust_folding() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        register_fold_function(&conn).unwrap();

        let folded: String = conn
            .query_row(&format!("SELECT {FOLD_FUNCTION}(?1);"), ["ÉCLAIR Zoë"], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(folded, fold_case("ÉCLAIR Zoë"));

        let null: Option<String> = conn
            .query_row(&format!("SELECT {FOLD_FUNCTION}(NULL);"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
