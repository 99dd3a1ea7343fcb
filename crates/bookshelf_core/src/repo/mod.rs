//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the CRUD contract the core consumes for book records.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths enforce the required-field rules before any mutation.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) apart
//!   from storage transport errors.

pub mod book_repo;
