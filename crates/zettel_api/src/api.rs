//! Use-case API for web or CLI front ends.
//!
//! # Responsibility
//! - Expose list/tags/fetch/create/save/delete/inbound-mail use-cases with
//!   serializable request and response envelopes.
//! - Open one connection per call so no state leaks across requests.
//!
//! # Invariants
//! - Every call either returns a full payload or an [`ApiError`]; storage
//!   failures are logged and reported generically.
//! - Authentication of interactive calls is the caller's job; only the
//!   inbound-mail path checks the shared secret itself.

use crate::error::{ApiError, ApiResult};
use chrono::DateTime;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zettel_core::db::open_db;
use zettel_core::{
    InboundMail, NoteDetail, NoteId, NoteOrder, NoteService, NoteServiceError, NoteSummary,
    ServiceResult, SqliteNoteRepository, TagUsage, ZettelConfig,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Settings the API needs per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub db_path: PathBuf,
    pub shared_secret: Option<String>,
}

impl From<&ZettelConfig> for ApiSettings {
    fn from(config: &ZettelConfig) -> Self {
        Self {
            db_path: config.db_path.clone(),
            shared_secret: config.shared_secret.clone(),
        }
    }
}

/// Listing request. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    pub search: String,
    pub tag_query: String,
    pub preselect_id: Option<NoteId>,
    /// Most recently modified first instead of id order.
    pub newest_first: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub id: NoteId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: NoteId,
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    pub id: NoteId,
    pub title: String,
    pub modified_date: String,
    /// Space-joined sorted tag names.
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteList {
    pub items: Vec<NoteListItem>,
    pub search: String,
    pub tag_query: String,
    /// Content of the preselected note, when requested and present.
    pub selected: Option<NoteContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagItem {
    pub tag_name: String,
    pub tag_id: i64,
    pub usage_count: u64,
}

/// Raw body plus rendered HTML of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteContent {
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNote {
    pub id: NoteId,
    pub title: String,
    pub modified_date: String,
    pub tags: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNote {
    pub title: String,
    pub modified_date: String,
    pub tags: String,
    pub text: String,
    pub html: String,
}

/// Empty success payload, serialized as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

/// Request-scoped entry point over the note store.
#[derive(Debug, Clone)]
pub struct ZettelApi {
    settings: ApiSettings,
}

impl ZettelApi {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &ZettelConfig) -> Self {
        Self::new(ApiSettings::from(config))
    }

    /// Lists notes filtered by body substring and tag query.
    pub fn list_notes(&self, request: &ListRequest) -> ApiResult<NoteList> {
        let order = if request.newest_first {
            NoteOrder::ModifiedDesc
        } else {
            NoteOrder::Id
        };
        let (summaries, selected) = self.with_service("note_list", |service| {
            let summaries = service.list_notes(&request.search, &request.tag_query, order)?;
            let selected = match request.preselect_id {
                Some(id) => match service.note_detail(id) {
                    Ok(detail) => Some(NoteContent::from(detail)),
                    Err(NoteServiceError::NoteNotFound(_)) => None,
                    Err(err) => return Err(err),
                },
                None => None,
            };
            Ok((summaries, selected))
        })?;

        Ok(NoteList {
            items: summaries.iter().map(NoteListItem::from).collect(),
            search: request.search.clone(),
            tag_query: request.tag_query.clone(),
            selected,
        })
    }

    /// Lists tags in use with their counts.
    pub fn list_tags(&self) -> ApiResult<Vec<TagItem>> {
        let tags = self.with_service("tag_list", |service| service.list_tags())?;
        Ok(tags.into_iter().map(TagItem::from).collect())
    }

    /// Returns raw text and rendered HTML of one note.
    pub fn fetch_note(&self, id: NoteId) -> ApiResult<NoteContent> {
        let detail = self.with_service("note_fetch", |service| service.note_detail(id))?;
        Ok(NoteContent::from(detail))
    }

    /// Creates a note, empty unless `body` is given.
    pub fn create_note(&self, body: Option<&str>) -> ApiResult<CreatedNote> {
        let detail = self.with_service("note_create", |service| {
            service.create_note(body.unwrap_or_default())
        })?;
        Ok(CreatedNote::from(detail))
    }

    /// Replaces a note body and returns the refreshed projections.
    pub fn save_note(&self, request: &SaveRequest) -> ApiResult<SavedNote> {
        let detail = self.with_service("note_save", |service| {
            service.save_note(request.id, &request.body)
        })?;
        Ok(SavedNote::from(detail))
    }

    /// Deletes a note; succeeds for ids that do not exist.
    pub fn delete_note(&self, request: &DeleteRequest) -> ApiResult<Empty> {
        self.with_service("note_delete", |service| service.delete_note(request.id))?;
        Ok(Empty {})
    }

    /// Creates a note from a mail addressed to `<secret>@...`.
    pub fn inbound_mail(&self, mail: &InboundMail) -> ApiResult<CreatedNote> {
        let secret = self.settings.shared_secret.as_deref();
        let detail = self.with_service("mail_ingest", |service| {
            service.create_from_mail(mail, secret)
        })?;
        info!("event=mail_ingest module=api status=ok note_id={}", detail.note.id);
        Ok(CreatedNote::from(detail))
    }

    pub fn save_note_json(&self, payload: &str) -> ApiResult<SavedNote> {
        self.save_note(&parse_request(payload)?)
    }

    pub fn delete_note_json(&self, payload: &str) -> ApiResult<Empty> {
        self.delete_note(&parse_request(payload)?)
    }

    pub fn inbound_mail_json(&self, payload: &str) -> ApiResult<CreatedNote> {
        self.inbound_mail(&parse_request(payload)?)
    }

    fn with_service<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> ServiceResult<T>,
    ) -> ApiResult<T> {
        let mut conn = open_db(&self.settings.db_path).map_err(|err| {
            error!(
                "event={operation} module=api status=error error_code=db_open_failed error={err}"
            );
            ApiError::StorageFailure
        })?;
        let repo = SqliteNoteRepository::try_new(&mut conn).map_err(|err| {
            error!(
                "event={operation} module=api status=error error_code=repo_init_failed error={err}"
            );
            ApiError::StorageFailure
        })?;
        let mut service = NoteService::new(repo);
        f(&mut service).map_err(|err| ApiError::from_service(operation, err))
    }
}

/// Parses a JSON request body; malformed or incomplete payloads are
/// validation failures.
pub fn parse_request<T: DeserializeOwned>(payload: &str) -> ApiResult<T> {
    serde_json::from_str(payload).map_err(|err| ApiError::ValidationFailure(err.to_string()))
}

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_modified(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|timestamp| timestamp.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

impl From<&NoteSummary> for NoteListItem {
    fn from(summary: &NoteSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            modified_date: format_modified(summary.modified_at),
            tags: summary.tags.join(" "),
        }
    }
}

impl From<TagUsage> for TagItem {
    fn from(tag: TagUsage) -> Self {
        Self {
            tag_name: tag.name,
            tag_id: tag.id,
            usage_count: tag.usage_count,
        }
    }
}

impl From<NoteDetail> for NoteContent {
    fn from(detail: NoteDetail) -> Self {
        Self {
            text: detail.note.body,
            html: detail.html,
        }
    }
}

impl From<NoteDetail> for CreatedNote {
    fn from(detail: NoteDetail) -> Self {
        Self {
            id: detail.note.id,
            modified_date: format_modified(detail.note.modified_at),
            tags: detail.note.tag_line(),
            title: detail.title,
            text: detail.note.body,
            html: detail.html,
        }
    }
}

impl From<NoteDetail> for SavedNote {
    fn from(detail: NoteDetail) -> Self {
        Self {
            modified_date: format_modified(detail.note.modified_at),
            tags: detail.note.tag_line(),
            title: detail.title,
            text: detail.note.body,
            html: detail.html,
        }
    }
}
