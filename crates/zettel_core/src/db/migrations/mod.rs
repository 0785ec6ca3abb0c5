//! Schema ladder for the note store.
//!
//! Each step declares the tables it introduces together with the columns the
//! repository reads, so an opened database can be checked against the layout
//! this binary expects before any note is touched.
//!
//! | version | file | tables |
//! |---------|------|--------|
//! | 1 | `0001_notes.sql` | `notes` |
//! | 2 | `0002_tags.sql` | `tags`, `note_tags` |

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// A table a schema step creates and the columns queried from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    label: &'static str,
    sql: &'static str,
    tables: &'static [TableLayout],
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        label: "notes",
        sql: include_str!("0001_notes.sql"),
        tables: &[TableLayout {
            name: "notes",
            columns: &["id", "body", "modified", "created"],
        }],
    },
    SchemaStep {
        version: 2,
        label: "tags",
        sql: include_str!("0002_tags.sql"),
        tables: &[
            TableLayout {
                name: "tags",
                columns: &["id", "name"],
            },
            TableLayout {
                name: "note_tags",
                columns: &["note_id", "tag_id"],
            },
        ],
    },
];

/// Schema version written by the newest step.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Every table of the current schema, oldest step first.
pub fn store_tables() -> impl Iterator<Item = &'static TableLayout> {
    SCHEMA_STEPS.iter().flat_map(|step| step.tables.iter())
}

/// Brings `conn` up to [`latest_version`] in one transaction.
///
/// Databases stamped with a newer version are refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }
    if from_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
        let tables: Vec<&str> = step.tables.iter().map(|table| table.name).collect();
        debug!(
            "event=db_migrate_step module=db version={} step={} tables={}",
            step.version,
            step.label,
            tables.join(",")
        );
    }
    verify_schema(&tx)?;
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}

/// Checks that every table and column of [`store_tables`] is present.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    for table in store_tables() {
        let present = table_columns(conn, table.name)?;
        if present.is_empty() {
            return Err(DbError::MissingTable(table.name));
        }
        if let Some(column) = table
            .columns
            .iter()
            .find(|column| !present.iter().any(|name| name == *column))
        {
            return Err(DbError::MissingColumn {
                table: table.name,
                column: *column,
            });
        }
    }
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

// `table_info` yields no rows for a table that does not exist.
fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}
