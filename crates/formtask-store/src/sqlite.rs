use std::collections::BTreeSet;
use std::path::Path;

use formtask_core::{to_canonical_json_bytes, ErrorInfo, ImportError, Task};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::schema::{
    find_dataset, init_schema, insert_dataset, insert_example, link_example, load_datasets,
    load_examples, store_error, DatasetRecord,
};
use crate::TaskStore;

/// SQLite backed task store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and prepares the schema.
    ///
    /// Fails immediately when the database is unavailable so an import never
    /// starts against a store it cannot write to.
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let conn = Connection::open(path).map_err(|err| {
            ImportError::Store(
                ErrorInfo::new("formtask.store_open", err.to_string())
                    .with_context("path", path.display().to_string())
                    .with_hint("check that the database path is writable"),
            )
        })?;
        init_schema(&conn)?;
        debug!(path = %path.display(), "opened task store");
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, ImportError> {
        let conn =
            Connection::open_in_memory().map_err(|err| store_error("formtask.store_open", err))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn datasets(&self) -> Result<Vec<DatasetRecord>, ImportError> {
        load_datasets(&self.conn)
    }

    fn dataset_id(&self, name: &str) -> Result<i64, ImportError> {
        find_dataset(&self.conn, name)?.ok_or_else(|| unknown_dataset(name))
    }

    pub fn count(&self, name: &str) -> Result<usize, ImportError> {
        Ok(load_examples(&self.conn, self.dataset_id(name)?)?.len())
    }

    /// Distinct input hashes present in the dataset.
    pub fn input_hashes(&self, name: &str) -> Result<BTreeSet<String>, ImportError> {
        let examples = load_examples(&self.conn, self.dataset_id(name)?)?;
        Ok(examples.into_iter().map(|(hash, _)| hash).collect())
    }

    /// Stored canonical JSON documents, in insertion order.
    pub fn load_contents(&self, name: &str) -> Result<Vec<String>, ImportError> {
        let examples = load_examples(&self.conn, self.dataset_id(name)?)?;
        Ok(examples.into_iter().map(|(_, content)| content).collect())
    }

    pub fn load_records(&self, name: &str) -> Result<Vec<Value>, ImportError> {
        self.load_contents(name)?
            .iter()
            .map(|content| formtask_core::from_json_slice(content.as_bytes()))
            .collect()
    }
}

fn unknown_dataset(name: &str) -> ImportError {
    ImportError::Store(
        ErrorInfo::new("formtask.unknown_dataset", format!("dataset '{name}' does not exist"))
            .with_context("dataset", name),
    )
}

impl TaskStore for SqliteStore {
    fn ensure_collection(&mut self, name: &str) -> Result<bool, ImportError> {
        let created = insert_dataset(&self.conn, name)?;
        if created {
            info!(dataset = name, "created dataset");
        } else {
            warn!(dataset = name, "dataset already exists, appending to it");
        }
        Ok(created)
    }

    fn append_records(
        &mut self,
        records: &[Task],
        collections: &[&str],
    ) -> Result<usize, ImportError> {
        if collections.is_empty() {
            return Err(store_error(
                "formtask.append_target",
                "append requires at least one dataset",
            ));
        }
        // Dropping the transaction without commit rolls back every insert.
        let tx = self
            .conn
            .transaction()
            .map_err(|err| store_error("formtask.transaction", err))?;
        let mut dataset_ids = Vec::with_capacity(collections.len());
        for name in collections {
            let id = find_dataset(&tx, name)?.ok_or_else(|| unknown_dataset(name))?;
            dataset_ids.push(id);
        }
        for record in records {
            let bytes = to_canonical_json_bytes(record)?;
            let content = String::from_utf8(bytes).map_err(|err| {
                ImportError::Serde(ErrorInfo::new("formtask.record_utf8", err.to_string()))
            })?;
            let example_id = insert_example(&tx, &record.input_hash, &record.task_hash, &content)?;
            for dataset_id in &dataset_ids {
                link_example(&tx, example_id, *dataset_id)?;
            }
        }
        tx.commit()
            .map_err(|err| store_error("formtask.commit", err))?;
        info!(
            records = records.len(),
            datasets = collections.len(),
            "appended records"
        );
        Ok(records.len())
    }
}
