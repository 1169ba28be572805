use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Args;
use formtask_store::{export_jsonl, export_jsonl_path, SqliteStore};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Dataset to export
    pub set_id: String,
    /// Output file; stdout when omitted
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// SQLite task database
    #[arg(long, default_value = "formtask.db")]
    pub db: PathBuf,
}

pub fn run(args: &ExportArgs) -> Result<(), Box<dyn Error>> {
    let store = SqliteStore::open(&args.db)?;
    match &args.out {
        Some(path) => {
            let count = export_jsonl_path(&store, &args.set_id, path)?;
            tracing::info!(count, path = %path.display(), "exported dataset");
        }
        None => {
            export_jsonl(&store, &args.set_id, io::stdout().lock())?;
        }
    }
    Ok(())
}
