use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use formtask_store::SqliteStore;

#[derive(Args, Debug)]
pub struct DatasetsArgs {
    /// SQLite task database
    #[arg(long, default_value = "formtask.db")]
    pub db: PathBuf,
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &DatasetsArgs) -> Result<(), Box<dyn Error>> {
    let store = SqliteStore::open(&args.db)?;
    let datasets = store.datasets()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&datasets)?);
        return Ok(());
    }
    for dataset in datasets {
        println!("{}\t{}\t{}", dataset.name, dataset.size, dataset.created);
    }
    Ok(())
}
