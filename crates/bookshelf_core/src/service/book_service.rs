//! Book use-case service.
//!
//! # Responsibility
//! - Serve listing requests by combining the search filter with the page
//!   window.
//! - Gate create/update writes: classify failures into recoverable form
//!   re-renders, not-found signals, or fatal errors.
//!
//! # Invariants
//! - A rejected write returns the caller's values verbatim, never a
//!   store-normalized copy.
//! - Update checks the target exists before attempting any write.
//! - Only validation and not-found are handled here; every other repository
//!   error passes through unchanged.

use crate::model::book::{Book, BookId, BookInput, BookValidationError};
use crate::repo::book_repo::{BookListQuery, BookRepository, RepoError};
use crate::search::filter::BookFilter;
use crate::search::page::{PageInfo, PageRequest};
use log::{debug, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for book use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    /// Target book does not exist.
    BookNotFound(BookId),
    /// Unrecovered persistence failure.
    Repo(RepoError),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::BookNotFound(_) => None,
        }
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BookNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Which form a caller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
}

impl FormMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Create => "New Book",
            Self::Edit => "Edit Book",
        }
    }
}

/// Form state handed to the caller for rendering.
///
/// With no messages this is a ready form; with messages it is the payload of
/// a rejected write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookForm {
    pub mode: FormMode,
    /// Target book for edit forms.
    pub book_id: Option<BookId>,
    pub values: BookInput,
    pub messages: Vec<String>,
}

impl BookForm {
    pub fn title(&self) -> &'static str {
        self.mode.title()
    }

    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// Result of a create/update attempt that did not fail fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Write persisted; the caller should navigate back to the listing.
    Saved(Book),
    /// Field rules rejected the write; the caller should re-render the form.
    Invalid(BookForm),
}

/// One listing page plus the echo of the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookListing {
    pub books: Vec<Book>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub page: PageInfo,
}

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists books matching `search` on the page named by a raw page value.
    pub fn list_books(
        &self,
        search: Option<&str>,
        page: Option<&str>,
    ) -> Result<BookListing, BookServiceError> {
        self.list_page(search, PageRequest::parse(page))
    }

    /// Lists books matching `search` inside an explicit page window.
    pub fn list_page(
        &self,
        search: Option<&str>,
        request: PageRequest,
    ) -> Result<BookListing, BookServiceError> {
        let started_at = Instant::now();
        let query = BookListQuery::page(BookFilter::from_search(search), request);
        let result = self.repo.list_books(&query)?;
        let page = PageInfo::new(request, result.total_count);

        debug!(
            "event=book_list module=service status=ok filtered={} page={} returned={} total_count={} duration_ms={}",
            query.filter.term().is_some(),
            page.page,
            result.books.len(),
            page.total_count,
            started_at.elapsed().as_millis()
        );

        Ok(BookListing {
            books: result.books,
            search: search.map(str::to_string),
            page,
        })
    }

    /// Gets one book by stable ID.
    pub fn get_book(&self, id: BookId) -> Result<Book, BookServiceError> {
        self.repo
            .get_book(id)?
            .ok_or(BookServiceError::BookNotFound(id))
    }

    /// Returns an empty create form.
    pub fn new_form(&self) -> BookForm {
        BookForm {
            mode: FormMode::Create,
            book_id: None,
            values: BookInput::default(),
            messages: Vec::new(),
        }
    }

    /// Returns an edit form pre-populated from the stored book.
    pub fn edit_form(&self, id: BookId) -> Result<BookForm, BookServiceError> {
        let book = self.get_book(id)?;
        Ok(BookForm {
            mode: FormMode::Edit,
            book_id: Some(id),
            values: BookInput::from_book(&book),
            messages: Vec::new(),
        })
    }

    /// Attempts to create a book from submitted values.
    ///
    /// # Contract
    /// - `Ok(Saved)` when persisted.
    /// - `Ok(Invalid)` with the submitted values and one message per violated
    ///   rule; nothing is persisted.
    /// - `Err` for any other failure, unchanged.
    pub fn create_book(&self, input: &BookInput) -> Result<WriteOutcome, BookServiceError> {
        let started_at = Instant::now();
        let written = input
            .to_new_book()
            .map_err(RepoError::from)
            .and_then(|new_book| self.repo.create_book(&new_book));

        match written {
            Ok(book) => {
                info!(
                    "event=book_create module=service status=ok book_id={} duration_ms={}",
                    book.id,
                    started_at.elapsed().as_millis()
                );
                Ok(WriteOutcome::Saved(book))
            }
            Err(RepoError::Validation(err)) => Ok(reject(FormMode::Create, None, input, &err)),
            Err(err) => Err(err.into()),
        }
    }

    /// Attempts a partial update of an existing book.
    ///
    /// # Contract
    /// - `Err(BookNotFound)` when `id` does not resolve, before any write.
    /// - Otherwise same outcomes as [`BookService::create_book`], in edit
    ///   mode.
    pub fn update_book(
        &self,
        id: BookId,
        input: &BookInput,
    ) -> Result<WriteOutcome, BookServiceError> {
        let started_at = Instant::now();
        if self.repo.get_book(id)?.is_none() {
            info!("event=book_update module=service status=not_found book_id={id}");
            return Err(BookServiceError::BookNotFound(id));
        }

        let written = input
            .to_patch()
            .map_err(RepoError::from)
            .and_then(|patch| self.repo.update_book(id, &patch));

        match written {
            Ok(book) => {
                info!(
                    "event=book_update module=service status=ok book_id={} duration_ms={}",
                    book.id,
                    started_at.elapsed().as_millis()
                );
                Ok(WriteOutcome::Saved(book))
            }
            Err(RepoError::Validation(err)) => Ok(reject(FormMode::Edit, Some(id), input, &err)),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the book a caller is about to delete.
    pub fn confirm_delete(&self, id: BookId) -> Result<Book, BookServiceError> {
        self.get_book(id)
    }

    /// Hard-deletes a book by ID.
    pub fn delete_book(&self, id: BookId) -> Result<(), BookServiceError> {
        self.repo.delete_book(id)?;
        info!("event=book_delete module=service status=ok book_id={id}");
        Ok(())
    }
}

fn reject(
    mode: FormMode,
    book_id: Option<BookId>,
    input: &BookInput,
    err: &BookValidationError,
) -> WriteOutcome {
    debug!(
        "event=book_write module=service status=invalid mode={:?} violations={}",
        mode,
        err.violations().len()
    );
    WriteOutcome::Invalid(BookForm {
        mode,
        book_id,
        values: input.clone(),
        messages: err.messages(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BookService, BookServiceError, FormMode, WriteOutcome};
    use crate::model::book::{Book, BookId, BookInput, BookPatch, NewBook};
    use crate::repo::book_repo::{BookListQuery, BookPage, BookRepository, RepoError, RepoResult};
    use std::cell::Cell;
    use uuid::Uuid;

    /// Repository whose every call fails with a storage fault.
    #[derive(Default)]
    struct BrokenRepo {
        calls: Cell<u32>,
    }

    impl BrokenRepo {
        fn fail<T>(&self) -> RepoResult<T> {
            self.calls.set(self.calls.get() + 1);
            Err(RepoError::InvalidData("storage offline".to_string()))
        }
    }

    impl BookRepository for BrokenRepo {
        fn create_book(&self, _book: &NewBook) -> RepoResult<Book> {
            self.fail()
        }
        fn update_book(&self, _id: BookId, _patch: &BookPatch) -> RepoResult<Book> {
            self.fail()
        }
        fn get_book(&self, _id: BookId) -> RepoResult<Option<Book>> {
            self.fail()
        }
        fn list_books(&self, _query: &BookListQuery) -> RepoResult<BookPage> {
            self.fail()
        }
        fn delete_book(&self, _id: BookId) -> RepoResult<()> {
            self.fail()
        }
    }

    fn valid_input() -> BookInput {
        BookInput {
            title: Some("Dune".to_string()),
            author: Some("Herbert".to_string()),
            ..BookInput::default()
        }
    }

    #[test]
    fn storage_failures_propagate_unchanged() {
        let service = BookService::new(BrokenRepo::default());

        let err = service.create_book(&valid_input()).unwrap_err();
        assert!(matches!(
            err,
            BookServiceError::Repo(RepoError::InvalidData(ref message)) if message == "storage offline"
        ));
        assert!(matches!(
            service.list_books(None, None),
            Err(BookServiceError::Repo(_))
        ));
    }

    #[test]
    fn invalid_input_is_rejected_before_touching_storage() {
        let service = BookService::new(BrokenRepo::default());
        let input = BookInput {
            title: Some(String::new()),
            author: Some("Herbert".to_string()),
            ..BookInput::default()
        };

        let outcome = service.create_book(&input).unwrap();
        let WriteOutcome::Invalid(form) = outcome else {
            panic!("expected validation payload");
        };
        assert_eq!(form.mode, FormMode::Create);
        assert_eq!(form.values, input);
        assert_eq!(service.repo.calls.get(), 0);
    }

    #[test]
    fn update_lookup_failure_is_fatal_not_not_found() {
        let service = BookService::new(BrokenRepo::default());
        let err = service
            .update_book(Uuid::new_v4(), &valid_input())
            .unwrap_err();
        assert!(matches!(err, BookServiceError::Repo(_)));
    }

    #[test]
    fn form_titles_follow_mode() {
        let service = BookService::new(BrokenRepo::default());
        let form = service.new_form();
        assert_eq!(form.title(), "New Book");
        assert!(!form.has_errors());
        assert_eq!(FormMode::Edit.title(), "Edit Book");
    }
}
