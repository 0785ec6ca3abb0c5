//! Domain model for notes and tags.
//!
//! # Responsibility
//! - Define the read models handed out by the repository and services.
//!
//! # Invariants
//! - Every note is identified by a storage-assigned integer `NoteId`.
//! - A note's `tags` mirror the trailing tag line of its current body.

pub mod note;
