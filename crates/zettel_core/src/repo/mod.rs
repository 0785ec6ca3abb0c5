//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note/tag data access contract.
//! - Keep SQLite query details away from query evaluation and services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_repo;
