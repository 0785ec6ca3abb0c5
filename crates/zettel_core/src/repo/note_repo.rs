//! Note/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and keep their tag associations in sync with the body.
//! - Execute the storage phase of filtered note queries.
//!
//! # Invariants
//! - Every write runs in a single immediate transaction: body, timestamps and
//!   associations commit together or not at all.
//! - Associations are replaced wholesale on every body write (delete-all then
//!   re-insert); tag rows are created lazily and never deleted.
//! - Tag names are stored and compared case-sensitively.

use crate::db::migrations::verify_schema;
use crate::db::DbError;
use crate::model::note::{NoteId, NoteRecord, TagUsage};
use crate::query::{NoteOrder, StorageFilter};
use crate::text::persisted_tags;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

// Epoch milliseconds; `julianday('now')` is stable within one statement.
const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    body,
    modified,
    created
FROM notes";

const LIKE_ESCAPE: char = '\\';

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note/tag persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for notes and their derived tags.
pub trait NoteRepository {
    /// Inserts a note and associates the tags of its trailing tag line.
    fn create_note(&mut self, body: &str) -> RepoResult<NoteRecord>;
    /// Gets one note with its sorted tag names.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>>;
    /// Replaces the body, bumps `modified` and recomputes associations.
    fn save_note(&mut self, id: NoteId, body: &str) -> RepoResult<NoteRecord>;
    /// Deletes associations and the note. Returns whether a note was removed.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool>;
    /// Lists tags used by at least one note, ordered by name.
    fn list_tags(&self) -> RepoResult<Vec<TagUsage>>;
    /// Returns the sorted tag names of one note.
    fn note_tags(&self, id: NoteId) -> RepoResult<Vec<String>>;
    /// Runs the SQL phase of a filtered listing.
    fn find_notes(&self, filter: &StorageFilter<'_>) -> RepoResult<Vec<NoteRecord>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the schema is missing a table the repository relies on.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&mut self) -> RepoResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, body: &str) -> RepoResult<NoteRecord> {
        let tx = self.begin()?;
        tx.execute(
            &format!("INSERT INTO notes (body, modified, created) VALUES (?1, {NOW_MS_SQL}, {NOW_MS_SQL});"),
            [body],
        )?;
        let id = tx.last_insert_rowid();
        let tag_count = replace_note_tags(&tx, id, body)?;
        let note = load_note(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("note {id} missing right after insert"))
        })?;
        tx.commit()?;

        info!("event=note_create module=repo status=ok note_id={id} tag_count={tag_count}");
        Ok(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        load_note(self.conn, id)
    }

    fn save_note(&mut self, id: NoteId, body: &str) -> RepoResult<NoteRecord> {
        let tx = self.begin()?;
        let changed = tx.execute(
            &format!("UPDATE notes SET body = ?1, modified = {NOW_MS_SQL} WHERE id = ?2;"),
            params![body, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let tag_count = replace_note_tags(&tx, id, body)?;
        let note = load_note(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;

        info!("event=note_save module=repo status=ok note_id={id} tag_count={tag_count}");
        Ok(note)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let tx = self.begin()?;
        tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id])?;
        let removed = tx.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=note_delete module=repo status=ok note_id={id} existed={}",
            removed > 0
        );
        Ok(removed > 0)
    }

    fn list_tags(&self) -> RepoResult<Vec<TagUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.name,
                t.id,
                COUNT(nt.note_id) AS usage_count
             FROM tags t
             INNER JOIN note_tags nt ON nt.tag_id = t.id
             GROUP BY t.id, t.name
             HAVING COUNT(nt.note_id) > 0
             ORDER BY t.name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let usage_count: i64 = row.get("usage_count")?;
            tags.push(TagUsage {
                name: row.get("name")?,
                id: row.get("id")?,
                usage_count: u64::try_from(usage_count).map_err(|_| {
                    RepoError::InvalidData(format!("negative tag usage count {usage_count}"))
                })?,
            });
        }
        Ok(tags)
    }

    fn note_tags(&self, id: NoteId) -> RepoResult<Vec<String>> {
        load_tags_for_note(self.conn, id)
    }

    fn find_notes(&self, filter: &StorageFilter<'_>) -> RepoResult<Vec<NoteRecord>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !filter.search.is_empty() {
            sql.push_str(" AND body LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_pattern(filter.search)));
        }

        if !filter.any_of.is_empty() {
            let placeholders = vec!["?"; filter.any_of.len()].join(", ");
            sql.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = notes.id
                      AND t.name IN ({placeholders})
                )"
            ));
            bind_values.extend(filter.any_of.iter().cloned().map(Value::Text));
        }

        if filter.untagged {
            sql.push_str(
                " AND NOT EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    WHERE nt.note_id = notes.id
                )",
            );
        }

        sql.push_str(match filter.order {
            NoteOrder::Id => " ORDER BY id ASC",
            NoteOrder::ModifiedDesc => " ORDER BY modified DESC, id DESC",
        });

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = load_tags_for_note(self.conn, note.id)?;
            notes.push(note);
        }

        debug!(
            "event=note_find module=repo status=ok any_of={} untagged={} hits={}",
            filter.any_of.len(),
            filter.untagged,
            notes.len()
        );
        Ok(notes)
    }
}

/// Builds a `LIKE` pattern matching `search` as a literal substring.
///
/// SQLite folds case for ASCII letters only; `É` does not match `é`.
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn replace_note_tags(tx: &Transaction<'_>, note_id: NoteId, body: &str) -> RepoResult<usize> {
    tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [note_id])?;

    let tags = persisted_tags(body);
    for tag in &tags {
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [tag.as_str()])?;
        tx.execute(
            "INSERT INTO note_tags (note_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2;",
            params![note_id, tag.as_str()],
        )?;
    }

    Ok(tags.len())
}

fn load_note(conn: &Connection, id: NoteId) -> RepoResult<Option<NoteRecord>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        let mut note = parse_note_row(row)?;
        note.tags = load_tags_for_note(conn, id)?;
        return Ok(Some(note));
    }

    Ok(None)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<NoteRecord> {
    Ok(NoteRecord {
        id: row.get("id")?,
        body: row.get("body")?,
        modified_at: row.get("modified")?,
        created_at: row.get("created")?,
        tags: Vec::new(),
    })
}

fn load_tags_for_note(conn: &Connection, note_id: NoteId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    verify_schema(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
