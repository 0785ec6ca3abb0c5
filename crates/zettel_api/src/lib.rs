//! Request-scoped use-case API over `zettel_core`.

pub mod api;
pub mod error;

pub use api::{
    format_modified, parse_request, ApiSettings, CreatedNote, DeleteRequest, Empty, ListRequest,
    NoteContent, NoteList, NoteListItem, SaveRequest, SavedNote, TagItem, ZettelApi,
};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use zettel_core::InboundMail;
