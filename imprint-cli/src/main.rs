//! Imprint CLI - provenance fingerprinting for documents and images.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

#[derive(Parser)]
#[command(name = "imprint")]
#[command(author, version, about = "Embed and compare provenance fingerprints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject an identifier into documents or images
    Inject {
        /// Files to watermark; a directory is scanned (non-recursively)
        /// for supported files
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Destination directory for the watermarked copies
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },

    /// Compare two watermarked files by their identifiers
    Compare {
        /// First file
        #[arg(value_name = "FILE1")]
        file1: PathBuf,

        /// Second file
        #[arg(value_name = "FILE2")]
        file2: PathBuf,

        /// Append the comparison outcome to a CSV log
        #[arg(long, value_name = "CSV")]
        log: Option<PathBuf>,

        /// Emit the comparison rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inject { paths, output } => commands::inject::execute(paths, output),
        Commands::Compare {
            file1,
            file2,
            log,
            json,
        } => commands::compare::execute(file1, file2, log, json),
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(exit_codes::classify(&err));
    }
}
