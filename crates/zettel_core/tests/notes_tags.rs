use rusqlite::{params, Connection};
use zettel_core::db::open_db_in_memory;
use zettel_core::{
    extract_tags, InboundMail, NoteRepository, NoteService, NoteServiceError, RepoError,
    SqliteNoteRepository,
};

#[test]
fn create_extracts_title_and_sorted_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let created = service.create_note("Buy milk\n#home #errand").unwrap();
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.note.tag_line(), "errand home");
    assert_eq!(created.note.created_at, created.note.modified_at);
    assert_eq!(created.html.trim(), "<p>Buy milk</p>");
    drop(service);

    assert_eq!(association_names(&conn, created.note.id), vec!["errand", "home"]);
}

#[test]
fn create_with_empty_body_has_no_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let note = repo.create_note("").unwrap();
    assert_eq!(note.body, "");
    assert!(note.tags.is_empty());
}

#[test]
fn save_then_get_roundtrips_body_and_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let note = repo.create_note("draft").unwrap();

    let body = "Plan\nsee #12\n#zeta #Alpha #beta #zeta";
    repo.save_note(note.id, body).unwrap();

    let loaded = repo.get_note(note.id).unwrap().unwrap();
    assert_eq!(loaded.body, body);
    let mut expected = extract_tags(body);
    expected.sort();
    expected.dedup();
    assert_eq!(loaded.tags, expected);
    assert_eq!(loaded.tags, vec!["Alpha", "beta", "zeta"]);
}

#[test]
fn save_replaces_previous_associations() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let note = repo.create_note("one\n#old #shared").unwrap();
        repo.save_note(note.id, "one\n#shared #new").unwrap();
        note.id
    };

    assert_eq!(association_names(&conn, id), vec!["new", "shared"]);
    // Unused tag rows stay behind.
    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 3);
}

#[test]
fn save_updates_modified_but_not_created() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        repo.create_note("first").unwrap().id
    };
    conn.execute(
        "UPDATE notes SET modified = 1000, created = 1000 WHERE id = ?1;",
        params![id],
    )
    .unwrap();

    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let saved = repo.save_note(id, "second").unwrap();
    assert_eq!(saved.created_at, 1000);
    assert!(saved.modified_at > 1000);
}

#[test]
fn save_missing_note_returns_not_found_and_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let err = repo.save_note(404, "ghost\n#phantom").unwrap_err();
        assert!(matches!(err, RepoError::NotFound(404)));
    }

    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 0);
}

#[test]
fn service_maps_missing_note_to_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    assert!(matches!(
        service.get_note(7).unwrap_err(),
        NoteServiceError::NoteNotFound(7)
    ));
    assert!(matches!(
        service.save_note(7, "x").unwrap_err(),
        NoteServiceError::NoteNotFound(7)
    ));
}

#[test]
fn delete_is_idempotent_and_removes_associations() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let note = repo.create_note("gone soon\n#tmp").unwrap();
        assert!(repo.delete_note(note.id).unwrap());
        assert!(!repo.delete_note(note.id).unwrap());
        assert!(repo.get_note(note.id).unwrap().is_none());
        note.id
    };

    assert!(association_names(&conn, id).is_empty());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn list_tags_counts_only_used_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    repo.create_note("a\n#work #urgent").unwrap();
    repo.create_note("b\n#work").unwrap();
    let dropped = repo.create_note("c\n#stale").unwrap();
    repo.save_note(dropped.id, "c without tags").unwrap();

    let tags = repo.list_tags().unwrap();
    let summary: Vec<(&str, u64)> = tags
        .iter()
        .map(|tag| (tag.name.as_str(), tag.usage_count))
        .collect();
    assert_eq!(summary, vec![("urgent", 1), ("work", 2)]);
}

#[test]
fn tag_names_are_case_sensitive() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    repo.create_note("a\n#Work").unwrap();
    repo.create_note("b\n#work").unwrap();

    let names: Vec<String> = repo
        .list_tags()
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(names, vec!["Work", "work"]);
}

#[test]
fn note_detail_renders_without_tag_line() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);
    let created = service
        .create_note("# Groceries\n- [ ] milk\n- [x] eggs\nsee #1\n#errand")
        .unwrap();

    let detail = service.note_detail(created.note.id).unwrap();
    assert_eq!(detail.title, "Groceries");
    assert!(detail.html.contains("<h1>Groceries</h1>"));
    assert!(detail.html.contains("disabled checked"));
    assert!(detail.html.contains("href=\"/index?id=1\""));
    assert!(!detail.html.contains("errand"));
}

#[test]
fn mail_with_secret_creates_tagged_note() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let mail = InboundMail {
        recipient: "hunter2@notes.example".to_string(),
        body: "From the road\n#travel\n\n\n".to_string(),
    };
    let created = service.create_from_mail(&mail, Some("hunter2")).unwrap();
    assert_eq!(created.note.body, "From the road\n#travel");
    assert_eq!(created.note.tags, vec!["travel"]);
}

#[test]
fn mail_with_wrong_or_missing_secret_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let mail = InboundMail {
            recipient: "guess@notes.example".to_string(),
            body: "spam".to_string(),
        };
        assert!(matches!(
            service.create_from_mail(&mail, Some("hunter2")).unwrap_err(),
            NoteServiceError::Unauthorized
        ));
        assert!(matches!(
            service.create_from_mail(&mail, None).unwrap_err(),
            NoteServiceError::Unauthorized
        ));
    }

    let notes: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(notes, 0);
}

fn association_names(conn: &Connection, note_id: i64) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT t.name
             FROM note_tags nt
             INNER JOIN tags t ON t.id = nt.tag_id
             WHERE nt.note_id = ?1
             ORDER BY t.name ASC;",
        )
        .unwrap();
    stmt.query_map([note_id], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}
