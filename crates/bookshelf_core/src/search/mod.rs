//! Listing query building blocks.
//!
//! # Responsibility
//! - Turn a free-text search term into a book filter predicate.
//! - Turn a requested page value into an offset/limit window and page counts.

pub mod filter;
pub mod page;
