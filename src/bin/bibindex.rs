// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! bibindex: build a `.bix` sidecar from a `.bib` bibliography.
//!
//! ```bash
//! # Index geom.bib into geom.bix
//! bibindex geom
//!
//! # Ignore a field while indexing
//! bibindex geom -i oldlabel -i fjournal
//! ```
//!
//! Default `-i` flags may also come from the `BIBINDEXFLAGS` environment
//! variable (whitespace-split), used only when no `-i` is given on the
//! command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "bibindex",
    about = "Index a BibTeX file for fast lookup with biblook",
    version
)]
struct Cli {
    /// Bibliography to index; a trailing .bib is accepted
    stem: String,

    /// Field to ignore (repeatable); its words are not indexed
    #[arg(short = 'i', value_name = "FIELD")]
    ignore: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let stem = cli.stem.strip_suffix(".bib").unwrap_or(&cli.stem);
    let source = PathBuf::from(format!("{}.bib", stem));
    let sidecar = PathBuf::from(format!("{}.bix", stem));

    let mut ignored = cli.ignore;
    if ignored.is_empty() {
        if let Ok(flags) = std::env::var("BIBINDEXFLAGS") {
            ignored = flags
                .split_whitespace()
                .filter(|token| *token != "-i")
                .map(str::to_string)
                .collect();
        }
    }

    if let Err(e) = bibix::build::index_file(&source, &sidecar, &ignored) {
        eprintln!("bibindex: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
