//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/save/get/delete and listing use-cases.
//! - Derive titles and rendered HTML for callers.
//! - Accept notes arriving by mail once the shared secret checks out.
//!
//! # Invariants
//! - A note's stored tag set always equals the tags of its current body.
//! - Listings never return a note that fails a required-tag check.

use crate::model::note::{NoteId, NoteRecord, TagUsage};
use crate::query::{evaluate, NoteOrder, NoteQuery, QueryParseError};
use crate::render::render_note;
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::service::inbound_mail::{recipient_matches_secret, trim_trailing_blank_lines, InboundMail};
use crate::text::title;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Tag query could not be parsed.
    InvalidQuery(QueryParseError),
    /// Inbound mail recipient did not carry the shared secret.
    Unauthorized,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidQuery(err) => write!(f, "invalid tag query: {err}"),
            Self::Unauthorized => write!(f, "recipient not authorized"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NoteNotFound(_) | Self::Unauthorized => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<QueryParseError> for NoteServiceError {
    fn from(value: QueryParseError) -> Self {
        Self::InvalidQuery(value)
    }
}

pub type ServiceResult<T> = Result<T, NoteServiceError>;

/// Listing row: what an index page shows per note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub modified_at: i64,
    /// Sorted tag names.
    pub tags: Vec<String>,
}

impl From<&NoteRecord> for NoteSummary {
    fn from(note: &NoteRecord) -> Self {
        Self {
            id: note.id,
            title: title(&note.body),
            modified_at: note.modified_at,
            tags: note.tags.clone(),
        }
    }
}

/// A note together with its display projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetail {
    pub note: NoteRecord,
    pub title: String,
    pub html: String,
}

impl From<NoteRecord> for NoteDetail {
    fn from(note: NoteRecord) -> Self {
        let title = title(&note.body);
        let html = render_note(&note.body);
        Self { note, title, html }
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists notes matching a body substring and a raw tag query.
    pub fn list_notes(
        &self,
        search: &str,
        tag_query: &str,
        order: NoteOrder,
    ) -> ServiceResult<Vec<NoteSummary>> {
        let query = NoteQuery::parse(search, tag_query)?.with_order(order);
        let notes = evaluate(&self.repo, &query)?;
        Ok(notes.iter().map(NoteSummary::from).collect())
    }

    /// Lists tags in use with their note counts.
    pub fn list_tags(&self) -> ServiceResult<Vec<TagUsage>> {
        Ok(self.repo.list_tags()?)
    }

    /// Gets one note or fails with `NoteNotFound`.
    pub fn get_note(&self, id: NoteId) -> ServiceResult<NoteRecord> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Gets one note with title and rendered HTML.
    pub fn note_detail(&self, id: NoteId) -> ServiceResult<NoteDetail> {
        self.get_note(id).map(NoteDetail::from)
    }

    /// Creates a note; tags on its last line are associated immediately.
    pub fn create_note(&mut self, body: &str) -> ServiceResult<NoteDetail> {
        Ok(self.repo.create_note(body)?.into())
    }

    /// Replaces the body of an existing note and re-syncs its tags.
    pub fn save_note(&mut self, id: NoteId, body: &str) -> ServiceResult<NoteDetail> {
        Ok(self.repo.save_note(id, body)?.into())
    }

    /// Deletes a note. Deleting a missing note succeeds.
    pub fn delete_note(&mut self, id: NoteId) -> ServiceResult<()> {
        self.repo.delete_note(id)?;
        Ok(())
    }

    /// Creates a note from an inbound mail.
    ///
    /// The recipient's local part must equal `shared_secret`; with no secret
    /// configured every mail is rejected. Trailing blank lines of the body are
    /// dropped before the normal create path runs.
    pub fn create_from_mail(
        &mut self,
        mail: &InboundMail,
        shared_secret: Option<&str>,
    ) -> ServiceResult<NoteDetail> {
        let authorized = shared_secret
            .map(|secret| recipient_matches_secret(&mail.recipient, secret))
            .unwrap_or(false);
        if !authorized {
            warn!("event=mail_ingest module=service status=rejected reason=unauthorized");
            return Err(NoteServiceError::Unauthorized);
        }

        let body = trim_trailing_blank_lines(&mail.body);
        self.create_note(body)
    }
}
