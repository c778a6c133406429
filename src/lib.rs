// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Two-stage BibTeX retrieval: batch indexing and interactive lookup.
//!
//! `bibindex` scans a `.bib` bibliography once and writes a compact
//! binary sidecar (`.bix`) of per-field inverted indexes; `biblook`
//! loads the sidecar and answers boolean keyword queries, printing the
//! matching records verbatim from the source file.
//!
//! # Architecture
//!
//! ```text
//!                  indexing                       lookup
//!   ┌───────────┐    ┌──────────┐     ┌───────────┐   ┌──────────┐
//!   │ lexer.rs  │───▶│ dict.rs  │     │ binary::  │──▶│ search,  │
//!   │ (Scanner, │    │ (field/  │     │ reader +  │   │ shell    │
//!   │ words)    │    │ abbrev)  │     │ cache.rs  │   │ (queries)│
//!   └───────────┘    └────┬─────┘     └─────▲─────┘   └────┬─────┘
//!         │               ▼                 │              ▼
//!   ┌───────────┐    ┌──────────┐     ┌───────────┐   ┌──────────┐
//!   │charclass  │    │ binary:: │────▶│ .bix file │   │bitset.rs │
//!   │ word.rs   │    │ writer   │     └───────────┘   │(EntrySet)│
//!   └───────────┘    └──────────┘                     └──────────┘
//! ```
//!
//! The sidecar format is bit-exact and big-endian throughout, so index
//! files can be built on one machine and queried on another. Posting
//! lists stay on disk until a query touches them; an LRU cache bounds
//! how many are resident at once.
//!
//! # Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use bibix::binary::Sidecar;
//! use bibix::search::LookupSession;
//!
//! let bib = File::open("geom.bib")?;
//! let bix = File::open("geom.bix")?;
//! let sidecar = Sidecar::load(&mut BufReader::new(bix.try_clone()?))?;
//! let mut session = LookupSession::new(sidecar, bib, bix);
//!
//! session.set_up_field("au");
//! session.find_word("erdos", false)?;
//! session.combine_results(false, true);
//! println!("{} matches", session.result_count());
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod binary;
pub mod bitset;
pub mod build;
pub mod cache;
pub mod charclass;
pub mod dict;
pub mod lexer;
pub mod search;
pub mod shell;
pub mod word;

// Re-exports for the public API
pub use binary::{Sidecar, FILE_VERSION};
pub use bitset::EntrySet;
pub use build::Indexer;
pub use cache::{PostingCache, CACHE_SIZE};
pub use dict::{AbbrevOrigin, AbbrevTable, BadWordTable, Dict, FieldTable, PostingList};
pub use lexer::{EntryKind, Scanner, ValueToken};
pub use search::LookupSession;
pub use word::{Word, BAD_WORDS, MAX_COMPOUND, MAX_WORD};
