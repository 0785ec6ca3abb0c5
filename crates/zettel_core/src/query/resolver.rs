//! Two-phase evaluation of listing criteria.
//!
//! The storage phase handles the substring, any-of and untagged predicates in
//! SQL. Required tags are checked afterwards against each candidate's full tag
//! set; an "all of N tags" condition would otherwise need N self-joins.

use crate::model::note::NoteRecord;
use crate::query::filter::NoteQuery;
use crate::repo::note_repo::{NoteRepository, RepoResult};
use log::debug;

/// Returns the notes matching `query`, in the query's order.
pub fn evaluate<R>(repo: &R, query: &NoteQuery) -> RepoResult<Vec<NoteRecord>>
where
    R: NoteRepository + ?Sized,
{
    let mut notes = repo.find_notes(&query.storage_filter())?;
    let required = query.tags.required();
    if !required.is_empty() {
        let candidates = notes.len();
        notes.retain(|note| note.has_all_tags(required));
        debug!(
            "event=note_query module=query status=ok required={} candidates={} kept={}",
            required.len(),
            candidates,
            notes.len()
        );
    }
    Ok(notes)
}
