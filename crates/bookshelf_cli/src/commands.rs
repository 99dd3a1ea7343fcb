//! Request dispatch for the bookshelf CLI.
//!
//! # Responsibility
//! - Map each subcommand onto one core book operation.
//! - Turn outcomes into response envelopes, including the single top-level
//!   handler for unexpected failures.
//!
//! # Invariants
//! - Unexpected failures are logged in full but reported only as a generic
//!   message.
//! - Unparsable ids are reported as not-found, like unknown ids.

use bookshelf_core::{
    logging_status, Book, BookForm, BookId, BookInput, BookListing, BookRepository,
    BookService, BookServiceError, WriteOutcome,
};
use clap::{Args, Subcommand};
use log::error;
use serde::Serialize;
use std::error::Error;

pub const GENERIC_FAILURE_MESSAGE: &str = "We goofed!";
const LISTING_LOCATION: &str = "/books";

/// Book operations exposed on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List books, optionally filtered by a search term.
    List {
        #[arg(long)]
        search: Option<String>,
        /// Page number; invalid values fall back to the first page.
        #[arg(long)]
        page: Option<String>,
    },
    /// Show one book.
    Show { id: String },
    /// Show an empty form for a new book.
    New,
    /// Submit a new book.
    Create(BookArgs),
    /// Show the edit form for a book.
    Edit { id: String },
    /// Submit changes to a book. Omitted fields are left untouched.
    Update {
        id: String,
        #[command(flatten)]
        fields: BookArgs,
    },
    /// Show the book about to be deleted.
    Delete { id: String },
    /// Delete a book.
    Remove { id: String },
    /// Print core health information.
    Health,
}

/// Field flags shared by `create` and `update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct BookArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
}

impl From<BookArgs> for BookInput {
    fn from(args: BookArgs) -> Self {
        Self {
            title: args.title,
            author: args.author,
            genre: args.genre,
            year: args.year,
        }
    }
}

/// Response envelope printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Listing(BookListing),
    Book {
        book: Book,
        published_at: String,
    },
    Form(BookForm),
    /// Write succeeded; the caller should go back to the listing.
    Redirect {
        location: &'static str,
        book_id: BookId,
    },
    NotFound {
        message: String,
    },
    Error {
        message: &'static str,
    },
    Health {
        ping: &'static str,
        version: &'static str,
    },
}

impl Response {
    /// Logs `err` and returns the generic failure envelope.
    ///
    /// Without an active logger the details go straight to stderr.
    pub fn failure(err: &dyn Error) -> Self {
        if logging_status().is_none() {
            eprintln!("bookshelf: request failed: {err}");
        }
        error!("event=request_failed module=cli status=error error={err}");
        Self::Error {
            message: GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Process exit status for this envelope.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Error { .. } => 1,
            Self::NotFound { .. } => 2,
            Self::Form(form) if form.has_errors() => 3,
            _ => 0,
        }
    }

    fn book(book: Book) -> Self {
        Self::Book {
            published_at: book.published_at(),
            book,
        }
    }

    fn not_found(id: &str) -> Self {
        Self::NotFound {
            message: format!("book not found: {id}"),
        }
    }
}

/// Runs one command against the service.
pub fn execute<R: BookRepository>(service: &BookService<R>, command: Command) -> Response {
    match command {
        Command::List { search, page } => {
            respond(service.list_books(search.as_deref(), page.as_deref()), Response::Listing)
        }
        Command::Show { id } => with_id(&id, |id| respond(service.get_book(id), Response::book)),
        Command::New => Response::Form(service.new_form()),
        Command::Create(fields) => respond(service.create_book(&fields.into()), written),
        Command::Edit { id } => with_id(&id, |id| respond(service.edit_form(id), Response::Form)),
        Command::Update { id, fields } => with_id(&id, |id| {
            respond(service.update_book(id, &fields.into()), written)
        }),
        Command::Delete { id } => {
            with_id(&id, |id| respond(service.confirm_delete(id), Response::book))
        }
        Command::Remove { id } => with_id(&id, |book_id| {
            respond(service.delete_book(book_id), |()| Response::Redirect {
                location: LISTING_LOCATION,
                book_id,
            })
        }),
        Command::Health => Response::Health {
            ping: bookshelf_core::ping(),
            version: bookshelf_core::core_version(),
        },
    }
}

fn with_id(raw: &str, f: impl FnOnce(BookId) -> Response) -> Response {
    match raw.trim().parse::<BookId>() {
        Ok(id) => f(id),
        Err(_) => Response::not_found(raw),
    }
}

fn respond<T>(
    result: Result<T, BookServiceError>,
    on_ok: impl FnOnce(T) -> Response,
) -> Response {
    match result {
        Ok(value) => on_ok(value),
        Err(BookServiceError::BookNotFound(id)) => Response::not_found(&id.to_string()),
        Err(err) => Response::failure(&err),
    }
}

fn written(outcome: WriteOutcome) -> Response {
    match outcome {
        WriteOutcome::Saved(book) => Response::Redirect {
            location: LISTING_LOCATION,
            book_id: book.id,
        },
        WriteOutcome::Invalid(form) => Response::Form(form),
    }
}
