// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The `.bix` sidecar format.
//!
//! The layout is fixed and bit-exact, with every multi-byte integer in
//! network (big-endian) order:
//!
//! ```text
//! ascii  "bibindex " <version> " " <major> " " <minor> " " <ctime> "\n"
//! u32    num_entries
//! u32[num_entries]   entry_offsets        -- byte offsets into the .bib
//! u16    num_fields
//! pstring[num_fields] field_names         -- sorted; u8 len + bytes
//! repeat num_fields:
//!     u32  num_words
//!     repeat num_words:                   -- sorted by word
//!         pstring word
//!         u16  posting_count
//!         u16  posting_bytes
//!         u8[posting_bytes] postings      -- delta varints
//! u32    num_abbrevs
//! pstring[num_abbrevs] abbrev_names       -- sorted
//! u32[num_abbrevs]     abbrev_origins     -- entry id or sentinel
//! ```
//!
//! The same module serves both programs: the indexer streams tables out
//! through `writer`, the lookup engine pulls them back through `reader`
//! with posting lists left on disk until the cache faults them in.

pub mod encoding;
pub mod header;
pub mod reader;
pub mod writer;

pub use encoding::{compress_refs, uncompress_refs};
pub use header::{FILE_VERSION, INDEX_BUILTIN, INDEX_NAN};
pub use reader::{CachedList, FieldIndex, IndexedWord, Sidecar};
pub use writer::{write_sidecar, FieldStats};
