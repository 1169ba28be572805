use chrono::Utc;
use formtask_core::{ErrorInfo, ImportError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    pub name: String,
    pub created: String,
    pub size: i64,
}

pub(crate) fn store_error(code: &str, err: impl ToString) -> ImportError {
    ImportError::Store(ErrorInfo::new(code, err.to_string()))
}

pub fn init_schema(conn: &Connection) -> Result<(), ImportError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS meta(version INTEGER NOT NULL);
        CREATE TABLE IF NOT EXISTS datasets(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS examples(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            input_hash TEXT NOT NULL,
            task_hash TEXT NOT NULL,
            content TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS links(
            example_id INTEGER NOT NULL,
            dataset_id INTEGER NOT NULL,
            FOREIGN KEY(example_id) REFERENCES examples(id),
            FOREIGN KEY(dataset_id) REFERENCES datasets(id)
        );
        CREATE INDEX IF NOT EXISTS links_dataset ON links(dataset_id);
        COMMIT;",
    )
    .map_err(|err| store_error("formtask.schema", err))?;
    set_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn set_version(conn: &Connection, version: i64) -> Result<(), ImportError> {
    let existing: Option<i64> = conn
        .query_row("SELECT version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| store_error("formtask.schema", err))?;
    match existing {
        Some(current) if current == version => Ok(()),
        Some(current) => Err(store_error(
            "formtask.schema_version",
            format!("store schema {current} incompatible with expected {version}"),
        )),
        None => {
            conn.execute("INSERT INTO meta(version) VALUES (?)", params![version])
                .map_err(|err| store_error("formtask.schema", err))?;
            Ok(())
        }
    }
}

/// Inserts the dataset unless it exists. Returns whether a row was added.
pub fn insert_dataset(conn: &Connection, name: &str) -> Result<bool, ImportError> {
    let created = Utc::now().to_rfc3339();
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO datasets(name, created) VALUES (?, ?)",
            params![name, created],
        )
        .map_err(|err| store_error("formtask.insert_dataset", err))?;
    Ok(changed > 0)
}

pub fn find_dataset(conn: &Connection, name: &str) -> Result<Option<i64>, ImportError> {
    conn.query_row(
        "SELECT id FROM datasets WHERE name = ?",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .map_err(|err| store_error("formtask.query", err))
}

pub fn insert_example(
    conn: &Connection,
    input_hash: &str,
    task_hash: &str,
    content: &str,
) -> Result<i64, ImportError> {
    conn.execute(
        "INSERT INTO examples(input_hash, task_hash, content) VALUES (?, ?, ?)",
        params![input_hash, task_hash, content],
    )
    .map_err(|err| store_error("formtask.insert_example", err))?;
    Ok(conn.last_insert_rowid())
}

pub fn link_example(
    conn: &Connection,
    example_id: i64,
    dataset_id: i64,
) -> Result<(), ImportError> {
    conn.execute(
        "INSERT INTO links(example_id, dataset_id) VALUES (?, ?)",
        params![example_id, dataset_id],
    )
    .map_err(|err| store_error("formtask.link_example", err))?;
    Ok(())
}

pub fn load_datasets(conn: &Connection) -> Result<Vec<DatasetRecord>, ImportError> {
    let mut stmt = conn
        .prepare(
            "SELECT d.id, d.name, d.created, COUNT(l.example_id)
             FROM datasets d LEFT JOIN links l ON l.dataset_id = d.id
             GROUP BY d.id ORDER BY d.name",
        )
        .map_err(|err| store_error("formtask.query", err))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DatasetRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created: row.get(2)?,
                size: row.get(3)?,
            })
        })
        .map_err(|err| store_error("formtask.query", err))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|err| store_error("formtask.query", err))
}

/// Returns `(input_hash, content)` for every example linked to the dataset, in insertion order.
pub fn load_examples(
    conn: &Connection,
    dataset_id: i64,
) -> Result<Vec<(String, String)>, ImportError> {
    let mut stmt = conn
        .prepare(
            "SELECT e.input_hash, e.content FROM examples e
             JOIN links l ON l.example_id = e.id
             WHERE l.dataset_id = ? ORDER BY e.id",
        )
        .map_err(|err| store_error("formtask.query", err))?;
    let rows = stmt
        .query_map([dataset_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|err| store_error("formtask.query", err))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|err| store_error("formtask.query", err))
}
