use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use formtask_core::{Answer, ImageEncoding};
use formtask_pipeline::{import_all, ImportConfig};
use formtask_store::SqliteStore;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Dataset to import annotations to
    pub set_id: String,
    /// Answer stored on every task (accept, reject or ignore)
    #[arg(long, short = 'a')]
    pub answer: Option<Answer>,
    /// Encode images to base64 before storing them
    #[arg(long = "encode-b64", short = 'e')]
    pub encode_b64: bool,
    /// Images root, overriding the config file
    #[arg(long)]
    pub images: Option<PathBuf>,
    /// Annotations root, overriding the config file
    #[arg(long)]
    pub labels: Option<PathBuf>,
    /// TOML import configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Build tasks on all cores
    #[arg(long)]
    pub parallel: bool,
    /// SQLite task database
    #[arg(long, default_value = "formtask.db")]
    pub db: PathBuf,
}

pub fn resolve_config(args: &ImportArgs) -> Result<ImportConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };
    if let Some(images) = &args.images {
        config.images_root = images.clone();
    }
    if let Some(labels) = &args.labels {
        config.labels_root = labels.clone();
    }
    if let Some(answer) = args.answer {
        config.default_answer = answer;
    }
    if args.encode_b64 {
        config.encoding = ImageEncoding::Base64;
    }
    if args.parallel {
        config.parallel = true;
    }
    Ok(config)
}

pub fn run(args: &ImportArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args)?;
    let mut store = SqliteStore::open(&args.db)?;
    let report = import_all(&mut store, &config, &args.set_id)?;
    println!(
        "imported {} tasks into '{}' ({} distinct inputs)",
        report.count, report.dataset, report.distinct_input_hashes
    );
    Ok(())
}
