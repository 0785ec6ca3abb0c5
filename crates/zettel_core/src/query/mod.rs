//! Tag-query parsing and filtered note retrieval.
//!
//! # Responsibility
//! - Parse raw tag-query strings into structured criteria.
//! - Evaluate criteria in two phases: SQL storage phase, then the
//!   required-tag post-filter.
//!
//! # Invariants
//! - `<none>` is exclusive: it never combines with other tag tokens, and it
//!   lists every untagged note whatever the search text.
//! - Tag names are matched case-sensitively, exactly as stored.

pub mod filter;
pub mod resolver;

pub use filter::{
    NoteOrder, NoteQuery, QueryParseError, StorageFilter, TagFilter, UNTAGGED_SENTINEL,
};
pub use resolver::evaluate;
