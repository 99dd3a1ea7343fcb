//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level book operations.
//! - Keep the request layer decoupled from storage details.

pub mod book_service;
