//! Core domain logic for the zettel note store.
//! This crate is the single source of truth for note/tag invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod render;
pub mod repo;
pub mod service;
pub mod text;

pub use config::{ConfigError, ZettelConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::note::{NoteId, NoteRecord, TagId, TagUsage};
pub use query::{evaluate, NoteOrder, NoteQuery, QueryParseError, StorageFilter, TagFilter};
pub use render::{render, render_note, MarkdownRenderer, RenderHooks};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::inbound_mail::InboundMail;
pub use service::note_service::{
    NoteDetail, NoteService, NoteServiceError, NoteSummary, ServiceResult,
};
pub use text::{compute_title, extract_tags, rewrite_cross_references, strip_tag_line, title};

