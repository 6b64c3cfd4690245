//! `pdfsearch` CLI: build, search, and inspect PDF corpus indexes.
//!
//! ```bash
//! # Build a persistent index over a directory of PDFs
//! pdfsearch index --input ./docs --output ./index
//!
//! # Search it
//! pdfsearch search --index ./index "brown fox" --limit 10
//!
//! # Print summary statistics
//! pdfsearch inspect --index ./index
//! ```

mod cli;
mod lopdf_extractor;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use pdfsearch::{CorpusIndex, IndexOptions};

use cli::{Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Index { input, output, force, continue_on_failure } => {
            run_index(&input, &output, force, continue_on_failure)
        }
        Commands::Search { index, query, limit } => run_search(&index, &query, limit),
        Commands::Inspect { index } => run_inspect(&index),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
        .unwrap()
        .progress_chars("━━╸")
}

fn run_index(input: &Path, output: &Path, force: bool, continue_on_failure: bool) -> pdfsearch::Result<()> {
    let paths = collect_pdf_paths(input)?;
    if paths.is_empty() {
        println!("no .pdf files found under {}", input.display());
        return Ok(());
    }

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(progress_style());
    pb.set_message("reading...");

    // Pre-read every file's bytes in parallel; the index itself stays
    // single-threaded and ingests them one at a time below.
    let loaded: Vec<(PathBuf, std::io::Result<Vec<u8>>)> =
        paths.into_par_iter().map(|path| (path.clone(), std::fs::read(&path))).collect();
    pb.finish_with_message("read complete");

    let pb = ProgressBar::new(loaded.len() as u64);
    pb.set_style(progress_style());
    pb.set_message("indexing...");
    let pb_for_report = pb.clone();

    let options = IndexOptions {
        persist_dir: Some(output.to_path_buf()),
        force_create: force,
        continue_on_failure,
        report: Some(Arc::new(move |line: &str| {
            pb_for_report.set_message(line.to_string());
            pb_for_report.inc(1);
        })),
        ..IndexOptions::default()
    };

    let started = Instant::now();
    let mut index = CorpusIndex::create(&[], options, lopdf_extractor::open_extractor)?;

    for (path, bytes) in loaded {
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                pb.inc(1);
                continue;
            }
        };
        match index.add_reader(&path, &mut Cursor::new(bytes), &|| false) {
            Ok(()) => {}
            Err(pdfsearch::Error::Duplicate { .. }) => pb.inc(1),
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                pb.inc(1);
            }
        }
    }

    index.close()?;
    pb.finish_with_message(format!("indexed {} documents in {:?}", index.doc_count(), started.elapsed()));
    Ok(())
}

fn run_search(index_dir: &Path, query: &str, limit: u32) -> pdfsearch::Result<()> {
    let options = IndexOptions::default();
    let mut index = CorpusIndex::reuse_index(index_dir, options, lopdf_extractor::open_extractor)?;

    let matches = index.search(query, Some(limit as i64))?;
    println!("{} total hit(s), showing up to {limit}:", matches.total);
    for page_match in &matches.matches {
        println!("  {} page {}", page_match.in_path.display(), page_match.page_num);
        for (line_num, line) in page_match.line_numbers.iter().zip(&page_match.lines) {
            println!("    {line_num}: {line}");
        }
    }
    Ok(())
}

fn run_inspect(index_dir: &Path) -> pdfsearch::Result<()> {
    let options = IndexOptions::default();
    let index = CorpusIndex::reuse_index(index_dir, options, lopdf_extractor::open_extractor)?;
    println!("index at {}", index_dir.display());
    println!("  documents: {}", index.doc_count());
    Ok(())
}

fn collect_pdf_paths(root: &Path) -> pdfsearch::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}
