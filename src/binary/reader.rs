// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sidecar deserialization.
//!
//! Loading is eager for everything except the posting lists: the reader
//! pulls in the offset table, every field's word list, and the full
//! abbreviation arrays, but for each posting list it records only the
//! lengths and the file offset of the compressed bytes, then seeks past
//! them. Postings are faulted in later through the cache, one list at a
//! time, so a session over a huge bibliography stays small.

use std::io::{self, Read, Seek, SeekFrom};

use crate::word::Word;

use super::encoding::{read_u16, read_u32, read_word};
use super::header::read_header;

/// A posting list as the lookup engine sees it: lengths, a file offset,
/// and the compressed bytes once (and while) they are resident.
#[derive(Debug, Clone)]
pub struct CachedList {
    /// Number of entry ids in the list.
    pub length: u16,
    /// Length of the compressed bytes on disk.
    pub bytes: u16,
    /// Offset of the compressed bytes within the sidecar.
    pub offset: u64,
    /// Resident compressed bytes, or `None` if not (or no longer) loaded.
    pub data: Option<Vec<u8>>,
    /// Back-reference into the cache heap while resident.
    pub rank: usize,
}

/// One word of one field, with its lazily loaded postings.
#[derive(Debug, Clone)]
pub struct IndexedWord {
    pub word: Word,
    pub refs: CachedList,
}

/// A field's sorted word list.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    pub name: Word,
    pub words: Vec<IndexedWord>,
}

/// Everything the lookup engine knows about a sidecar.
#[derive(Debug)]
pub struct Sidecar {
    /// Source byte offset of each entry, in entry-id order.
    pub offsets: Vec<u32>,
    /// Field tables, sorted by field name.
    pub fields: Vec<FieldIndex>,
    /// Abbreviation names, sorted.
    pub abbrevs: Vec<Word>,
    /// Parallel origin array (entry id or sentinel).
    pub abbrev_locs: Vec<u32>,
}

impl Sidecar {
    /// Load a sidecar, validating the version line first.
    pub fn load<R: Read + Seek>(r: &mut R) -> io::Result<Self> {
        read_header(r)?;

        let num_entries = read_u32(r)? as usize;
        let mut offsets = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            offsets.push(read_u32(r)?);
        }

        let num_fields = read_u16(r)? as usize;
        let mut names = Vec::with_capacity(num_fields);
        for _ in 0..num_fields {
            names.push(read_word(r)?);
        }

        let mut fields = Vec::with_capacity(num_fields);
        for name in names {
            let num_words = read_u32(r)? as usize;
            let mut words = Vec::with_capacity(num_words);
            for _ in 0..num_words {
                let word = read_word(r)?;
                let length = read_u16(r)?;
                let bytes = read_u16(r)?;
                let offset = r.stream_position()?;
                r.seek(SeekFrom::Current(i64::from(bytes)))?;
                words.push(IndexedWord {
                    word,
                    refs: CachedList {
                        length,
                        bytes,
                        offset,
                        data: None,
                        rank: 0,
                    },
                });
            }
            fields.push(FieldIndex { name, words });
        }

        let num_abbrevs = read_u32(r)? as usize;
        let mut abbrevs = Vec::with_capacity(num_abbrevs);
        for _ in 0..num_abbrevs {
            abbrevs.push(read_word(r)?);
        }
        let mut abbrev_locs = Vec::with_capacity(num_abbrevs);
        for _ in 0..num_abbrevs {
            abbrev_locs.push(read_u32(r)?);
        }

        Ok(Sidecar {
            offsets,
            fields,
            abbrevs,
            abbrev_locs,
        })
    }

    pub fn num_entries(&self) -> usize {
        self.offsets.len()
    }
}
