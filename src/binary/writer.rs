// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sidecar serialization.
//!
//! The writer consumes the indexer's tables, so compaction is just a
//! drain: occupied dictionary slots are pulled out, sorted by their
//! truncated words, and streamed to disk in the fixed layout (see the
//! module docs on `binary`). Black-hole fields are omitted entirely -
//! the lookup engine never learns they existed.
//!
//! Posting counts and compressed byte lengths travel as u16, which bounds
//! a single word at 65535 references and 65535 compressed bytes. Blowing
//! either bound is a hard error rather than silent wraparound.

use std::io::{self, Write};
use std::time::SystemTime;

use crate::dict::{AbbrevOrigin, AbbrevTable, FieldTable};
use crate::word::Word;

use super::encoding::{compress_refs, write_u16, write_u32, write_word};
use super::header::{write_header, INDEX_BUILTIN, INDEX_NAN};

/// Per-field statistics, reported by the indexer after a write.
#[derive(Debug, Clone)]
pub struct FieldStats {
    pub name: Word,
    pub words: usize,
    pub refs: usize,
}

/// Serialize the index tables into `out`.
///
/// `source_mtime` seeds the header timestamp; entry `offsets` are in
/// source order. Returns per-field statistics for the summary table.
pub fn write_sidecar<W: Write>(
    out: &mut W,
    source_mtime: SystemTime,
    offsets: &[u32],
    fields: FieldTable,
    abbrevs: AbbrevTable,
) -> io::Result<Vec<FieldStats>> {
    write_header(out, source_mtime)?;

    // Entry offset table.
    write_u32(out, offsets.len() as u32)?;
    for &offset in offsets {
        write_u32(out, offset)?;
    }

    // Field names, sorted; black holes are already gone.
    let fields = fields.into_sorted();
    write_u16(out, fields.len() as u16)?;
    for (name, _) in &fields {
        write_word(out, name)?;
    }

    // Per-field word tables.
    let mut stats = Vec::with_capacity(fields.len());
    for (name, dict) in fields {
        let words = dict.into_sorted();
        write_u32(out, words.len() as u32)?;

        let mut refs = 0usize;
        for (word, postings) in &words {
            write_word(out, word)?;

            let count = postings.len();
            if count > usize::from(u16::MAX) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("too many references for word: {}", word),
                ));
            }
            let compressed = compress_refs(postings.ids());
            if compressed.len() > usize::from(u16::MAX) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("compressed posting list too long for word: {}", word),
                ));
            }

            write_u16(out, count as u16)?;
            write_u16(out, compressed.len() as u16)?;
            out.write_all(&compressed)?;
            refs += count;
        }

        stats.push(FieldStats {
            name,
            words: words.len(),
            refs,
        });
    }

    // Abbreviation names, then the parallel origin array.
    let abbrevs = abbrevs.into_sorted();
    write_u32(out, abbrevs.len() as u32)?;
    for (name, _) in &abbrevs {
        write_word(out, name)?;
    }
    for (_, cell) in &abbrevs {
        let origin = match cell.origin {
            AbbrevOrigin::Builtin => INDEX_BUILTIN,
            AbbrevOrigin::Undefined => INDEX_NAN,
            AbbrevOrigin::Entry(entry) => entry,
        };
        write_u32(out, origin)?;
    }

    Ok(stats)
}
