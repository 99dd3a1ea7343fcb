//! Book domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Separate raw submitted input from typed create/update inputs.
//!
//! # Invariants
//! - Every book is identified by a stable `BookId`.
//! - Deletion is a hard delete; no tombstones are kept.

pub mod book;
