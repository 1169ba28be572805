use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    datasets::{self, DatasetsArgs},
    export::{self, ExportArgs},
    import::{self, ImportArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "formtask", about = "Import annotated form images as review tasks")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import every image/annotation pair into a dataset.
    Import(ImportArgs),
    /// Write a dataset's tasks as JSON lines.
    Export(ExportArgs),
    /// List datasets and their sizes.
    Datasets(DatasetsArgs),
}

/// Filter used when RUST_LOG is unset; dependencies stay quiet.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "formtask=debug"
    } else {
        "formtask=info"
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Import(args) => import::run(&args),
        Command::Export(args) => export::run(&args),
        Command::Datasets(args) => datasets::run(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_targets_only_formtask_crates() {
        assert_eq!(default_filter(false), "formtask=info");
        assert_eq!(default_filter(true), "formtask=debug");
        for verbose in [false, true] {
            assert!(default_filter(verbose).parse::<EnvFilter>().is_ok());
        }
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["formtask", "datasets", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
