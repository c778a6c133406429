// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! biblook: interactive lookup in a bibindex'ed BibTeX bibliography.
//!
//! ```bash
//! biblook geom            # query geom.bib via geom.bix
//! biblook geom picks.bib  # `save' appends to picks.bib by default
//! ```
//!
//! The stem is resolved against `BIBLOOKPATH`, then `BIBINPUTS`
//! (colon-separated directories; `.` means the bare stem). The sidecar
//! must be at least as new as the bibliography, or biblook refuses to
//! start - a stale index quietly returning wrong entries is far worse
//! than an error.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use bibix::binary::Sidecar;
use bibix::search::LookupSession;
use bibix::shell;

#[derive(Parser)]
#[command(
    name = "biblook",
    about = "Interactive keyword lookup in a bibindex'ed bibliography",
    version
)]
struct Cli {
    /// Bibliography stem; a trailing .bib is accepted
    stem: String,

    /// Default file for the `save' command
    savefile: Option<String>,
}

/// Resolve the stem against BIBLOOKPATH / BIBINPUTS.
fn resolve_stem(stem: &str) -> PathBuf {
    if stem.starts_with('/') {
        return PathBuf::from(stem);
    }
    let path = std::env::var("BIBLOOKPATH")
        .or_else(|_| std::env::var("BIBINPUTS"))
        .unwrap_or_default();
    if path.is_empty() {
        return PathBuf::from(stem);
    }

    for dir in path.split(':') {
        let candidate = if dir == "." || dir.is_empty() {
            PathBuf::from(stem)
        } else {
            Path::new(dir).join(stem)
        };
        if candidate.with_extension("bib").exists() {
            return candidate;
        }
    }
    PathBuf::from(stem)
}

fn open_session(stem: &Path) -> io::Result<LookupSession<File>> {
    let bib_path = stem.with_extension("bib");
    let bix_path = stem.with_extension("bix");

    let bib_meta = std::fs::metadata(&bib_path).map_err(|e| {
        io::Error::new(e.kind(), format!("can't open {}: {}", bib_path.display(), e))
    })?;
    let bix_meta = std::fs::metadata(&bix_path).map_err(|e| {
        io::Error::new(e.kind(), format!("can't open {}: {}", bix_path.display(), e))
    })?;

    if let (Ok(bib_time), Ok(bix_time)) = (bib_meta.modified(), bix_meta.modified()) {
        if bib_time > bix_time {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} is out of date; please rerun bibindex",
                    bix_path.display()
                ),
            ));
        }
    }

    let bib = File::open(&bib_path)?;
    let bix = File::open(&bix_path)?;

    let mut reader = BufReader::new(bix);
    let sidecar = Sidecar::load(&mut reader)?;
    let bix = reader.into_inner();

    Ok(LookupSession::new(sidecar, bib, bix))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let stem_arg = cli.stem.strip_suffix(".bib").unwrap_or(&cli.stem);
    let stem = resolve_stem(stem_arg);

    let mut session = match open_session(&stem) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("biblook: {}", e);
            return ExitCode::FAILURE;
        }
    };

    shell::banner();
    println!("Type ? or h for help.");
    println!();

    let save_file = cli.savefile.as_deref().unwrap_or("save.bib");
    let stdin = io::stdin();
    match shell::run(&mut session, stdin.lock(), save_file, true) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("biblook: {}", e);
            ExitCode::FAILURE
        }
    }
}
