//! CLI definitions for the `pdfsearch` command-line interface.
//!
//! Three subcommands: `index` to build a corpus index over a directory of
//! PDFs, `search` to query one, and `inspect` to print its summary
//! statistics.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pdfsearch", about = "Full-text search over PDF corpora", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a persistent index over every PDF in a directory
    Index {
        /// Directory to scan recursively for `.pdf` files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the index is written to
        #[arg(short, long)]
        output: PathBuf,

        /// Overwrite an existing index rooted at `output`
        #[arg(long)]
        force: bool,

        /// Keep going when a PDF fails to extract instead of aborting the run
        #[arg(long, default_value_t = true)]
        continue_on_failure: bool,
    },

    /// Query a persistent index built by `index`
    Search {
        /// Directory of a previously built index
        #[arg(short, long)]
        index: PathBuf,

        /// Search phrase
        query: String,

        /// Maximum number of page matches to return
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// Print summary statistics for a persistent index
    Inspect {
        /// Directory of a previously built index
        #[arg(short, long)]
        index: PathBuf,
    },
}
