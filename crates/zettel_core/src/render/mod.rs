//! Markdown to HTML rendering for note bodies.
//!
//! # Responsibility
//! - Convert prepared note text to HTML.
//! - Let callers override task-list items, tables and note links through
//!   plain function hooks.
//!
//! # Invariants
//! - Rendering is pure and never panics; unparseable fragments fall back to
//!   escaped text.

pub mod markdown;

pub use markdown::{render, render_note, MarkdownRenderer, RenderHooks};
