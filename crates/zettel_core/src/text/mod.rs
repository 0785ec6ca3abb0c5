//! Text transforms over raw note bodies.
//!
//! # Responsibility
//! - Split a body into prose and its trailing tag line.
//! - Derive display titles and note-to-note links.
//!
//! # Invariants
//! - The last line of a multi-line body is reserved for tags; every other
//!   line is prose, where `#<digits>` is a cross-reference.
//! - Transforms are pure and never fail.

pub mod transform;

pub use transform::{
    compute_title, extract_tags, persisted_tags, prepare_for_render, rewrite_cross_references,
    strip_tag_line, title, DEFAULT_TITLE_LENGTH, NOTE_REF_SCHEME,
};
