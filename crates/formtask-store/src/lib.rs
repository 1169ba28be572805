//! Task store collaborator for formtask imports.

pub mod export;
pub mod schema;
pub mod sqlite;

use formtask_core::{ImportError, Task};

pub use export::{export_jsonl, export_jsonl_path};
pub use schema::{init_schema, DatasetRecord, SCHEMA_VERSION};
pub use sqlite::SqliteStore;

/// Destination of an import: named append-only collections of tasks.
pub trait TaskStore {
    /// Creates the collection if it does not exist. Returns `true` when created.
    fn ensure_collection(&mut self, name: &str) -> Result<bool, ImportError>;

    /// Appends `records` to every named collection as one unit.
    fn append_records(
        &mut self,
        records: &[Task],
        collections: &[&str],
    ) -> Result<usize, ImportError>;
}
