use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use formtask_core::{ErrorInfo, ImportError};

use crate::sqlite::SqliteStore;

fn export_error(code: &str, err: impl ToString) -> ImportError {
    ImportError::Io(ErrorInfo::new(code, err.to_string()))
}

/// Writes every record of `dataset` as one JSON object per line.
pub fn export_jsonl<W: Write>(
    store: &SqliteStore,
    dataset: &str,
    mut writer: W,
) -> Result<usize, ImportError> {
    let contents = store.load_contents(dataset)?;
    for content in &contents {
        writer
            .write_all(content.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|err| export_error("formtask.export_write", err))?;
    }
    writer
        .flush()
        .map_err(|err| export_error("formtask.export_write", err))?;
    Ok(contents.len())
}

pub fn export_jsonl_path(
    store: &SqliteStore,
    dataset: &str,
    out_path: &Path,
) -> Result<usize, ImportError> {
    let file = File::create(out_path)
        .map_err(|err| ImportError::io("formtask.export_open", out_path, &err))?;
    export_jsonl(store, dataset, BufWriter::new(file))
}
