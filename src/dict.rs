// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Open-addressed dictionaries keyed by truncated [`Word`]s.
//!
//! All four tables the indexer maintains (per-field word dictionaries, the
//! field table itself, the abbreviation table, and the stop-word table)
//! share one hashing scheme: multiply-and-add over the first 31 key bytes
//! with a prime close to 2^20.5, double hashing for collisions, and a
//! power-of-two capacity so the modulo is a mask. The secondary skip is
//! always odd (it starts at 1 and accumulates even increments), so the
//! probe sequence visits every slot.
//!
//! Tables grow by doubling before occupancy reaches 15/16. The field
//! table is the exception: it has a fixed capacity, and running out of
//! distinct field names is a fatal error, since growing it would change
//! where claimed slots live while black-hole markers point at them.
//!
//! Equality is equality of the truncated key. Two words that agree on
//! their first 31 bytes land in the same cell on purpose; the sidecar
//! stores truncated words, so the lookup side must collide identically.

use std::io;

use crate::word::{Word, MAX_WORD};

/// Multiplier for the word hash; prime close to 2^20.5.
const HASH_CONST: u64 = 1_482_907;

/// Initial capacity of a word dictionary (power of two, >= `MAX_FIELDS`).
const INIT_DICT_SIZE: usize = 256;

/// Fixed capacity of the field table (power of two).
pub const MAX_FIELDS: usize = 256;

/// Primary and secondary hash of a word, before masking.
fn hash_pair(word: &[u8]) -> (u64, u64) {
    let mut hash: u64 = 0;
    let mut skip: u64 = 1;
    for &b in word.iter().take(MAX_WORD) {
        hash = hash.wrapping_mul(HASH_CONST).wrapping_add(u64::from(b));
        skip = skip.wrapping_add(hash.wrapping_mul(2));
    }
    (hash, skip)
}

// ============================================================================
// GENERIC DICTIONARY
// ============================================================================

#[derive(Debug, Clone)]
struct Slot<T> {
    word: Word,
    value: T,
}

/// Growable open-addressed dictionary from [`Word`] to `T`.
#[derive(Debug, Clone)]
pub struct Dict<T> {
    slots: Vec<Option<Slot<T>>>,
    len: usize,
}

impl<T> Dict<T> {
    pub fn new() -> Self {
        Dict {
            slots: (0..INIT_DICT_SIZE).map(|_| None).collect(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot holding `word`, or of the empty slot where it
    /// would go. Capacity is a power of two and the skip is odd, so the
    /// probe sequence is a full cycle and this always terminates while
    /// occupancy stays below capacity.
    fn probe(&self, word: &Word) -> usize {
        let mask = self.slots.len() - 1;
        let (hash, skip) = hash_pair(word.as_bytes());
        let mut idx = (hash as usize) & mask;
        loop {
            match &self.slots[idx] {
                None => return idx,
                Some(slot) if slot.word == *word => return idx,
                Some(_) => idx = idx.wrapping_add(skip as usize) & mask,
            }
        }
    }

    pub fn get(&self, word: &Word) -> Option<&T> {
        self.slots[self.probe(word)].as_ref().map(|s| &s.value)
    }

    pub fn get_mut(&mut self, word: &Word) -> Option<&mut T> {
        let idx = self.probe(word);
        self.slots[idx].as_mut().map(|s| &mut s.value)
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.slots[self.probe(word)].is_some()
    }

    /// Fetch the value for `word`, claiming a cell with `default()` if it
    /// is not present yet. Grows the table first when the insertion would
    /// push occupancy to 15/16.
    pub fn entry_or_insert_with(&mut self, word: &Word, default: impl FnOnce() -> T) -> &mut T {
        if (self.len + 1) * 16 >= self.slots.len() * 15 {
            self.grow();
        }
        let idx = self.probe(word);
        if self.slots[idx].is_none() {
            self.slots[idx] = Some(Slot {
                word: *word,
                value: default(),
            });
            self.len += 1;
        }
        match self.slots[idx].as_mut() {
            Some(slot) => &mut slot.value,
            None => unreachable!("slot was just claimed"),
        }
    }

    /// Double the capacity and rehash every occupied slot.
    fn grow(&mut self) {
        let new_cap = self.slots.len() * 2;
        let mut new_slots: Vec<Option<Slot<T>>> = (0..new_cap).map(|_| None).collect();
        let mask = new_cap - 1;
        for slot in self.slots.drain(..).flatten() {
            let (hash, skip) = hash_pair(slot.word.as_bytes());
            let mut idx = (hash as usize) & mask;
            while new_slots[idx].is_some() {
                idx = idx.wrapping_add(skip as usize) & mask;
            }
            new_slots[idx] = Some(slot);
        }
        self.slots = new_slots;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, &T)> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (&slot.word, &slot.value))
    }

    /// Drain the occupied slots, sorted by word.
    pub fn into_sorted(self) -> Vec<(Word, T)> {
        let mut entries: Vec<(Word, T)> = self
            .slots
            .into_iter()
            .flatten()
            .map(|slot| (slot.word, slot.value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<T> Default for Dict<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// POSTING LISTS
// ============================================================================

/// Ordered list of distinct entry ids in which a word appears.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    ids: Vec<u32>,
}

impl PostingList {
    /// Append an entry id. Entries are processed in source order, so a
    /// repeat within one entry always arrives as a repeat of the current
    /// last id and is dropped, keeping the list strictly increasing.
    pub fn push(&mut self, entry: u32) {
        if self.ids.last() == Some(&entry) {
            return;
        }
        self.ids.push(entry);
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ============================================================================
// FIELD TABLE
// ============================================================================

/// One claimed field: its name and its word dictionary. A field whose
/// dictionary is `None` is a black hole; insertions into it vanish.
#[derive(Debug)]
pub struct FieldSlot {
    pub name: Word,
    pub dict: Option<Dict<PostingList>>,
}

/// Fixed-capacity table from field name to word dictionary.
#[derive(Debug)]
pub struct FieldTable {
    slots: Vec<Option<FieldSlot>>,
    len: usize,
}

impl FieldTable {
    pub fn new() -> Self {
        FieldTable {
            slots: (0..MAX_FIELDS).map(|_| None).collect(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot index for `name`, claiming it if new. Exhausting the table is
    /// fatal: the capacity cannot grow without invalidating claimed slots.
    pub fn slot(&mut self, name: &Word) -> io::Result<usize> {
        let mask = MAX_FIELDS - 1;
        let (hash, skip) = hash_pair(name.as_bytes());
        let mut idx = (hash as usize) & mask;
        loop {
            match &self.slots[idx] {
                None => break,
                Some(slot) if slot.name == *name => return Ok(idx),
                Some(_) => idx = idx.wrapping_add(skip as usize) & mask,
            }
        }
        if self.len + 1 >= MAX_FIELDS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("too many field names: {}", name),
            ));
        }
        self.slots[idx] = Some(FieldSlot {
            name: *name,
            dict: Some(Dict::new()),
        });
        self.len += 1;
        Ok(idx)
    }

    /// Turn the field into a black hole: claimed, but discarding words.
    pub fn make_black_hole(&mut self, name: &Word) -> io::Result<()> {
        let idx = self.slot(name)?;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.dict = None;
        }
        Ok(())
    }

    pub fn is_black_hole(&self, idx: usize) -> bool {
        matches!(&self.slots[idx], Some(slot) if slot.dict.is_none())
    }

    /// Insert a (word, entry) pair into the field at `idx`. No-op for
    /// black holes.
    pub fn insert(&mut self, idx: usize, word: &Word, entry: u32) {
        if let Some(slot) = self.slots[idx].as_mut() {
            if let Some(dict) = slot.dict.as_mut() {
                dict.entry_or_insert_with(word, PostingList::default)
                    .push(entry);
            }
        }
    }

    pub fn get(&self, name: &Word) -> Option<&FieldSlot> {
        let mask = MAX_FIELDS - 1;
        let (hash, skip) = hash_pair(name.as_bytes());
        let mut idx = (hash as usize) & mask;
        loop {
            match &self.slots[idx] {
                None => return None,
                Some(slot) if slot.name == *name => return self.slots[idx].as_ref(),
                Some(_) => idx = idx.wrapping_add(skip as usize) & mask,
            }
        }
    }

    /// Drain the real (non-black-hole) fields, sorted by name.
    pub fn into_sorted(self) -> Vec<(Word, Dict<PostingList>)> {
        let mut fields: Vec<(Word, Dict<PostingList>)> = self
            .slots
            .into_iter()
            .flatten()
            .filter_map(|slot| slot.dict.map(|dict| (slot.name, dict)))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields
    }
}

impl Default for FieldTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ABBREVIATION TABLE
// ============================================================================

/// Where an abbreviation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbrevOrigin {
    /// Seeded at startup (month names, optionally journals).
    Builtin,
    /// Referenced before (or without) a definition.
    Undefined,
    /// Defined by the `@string` at this entry id.
    Entry(u32),
}

/// An abbreviation: its origin plus the words of its expansion.
#[derive(Debug, Clone)]
pub struct AbbrevCell {
    pub origin: AbbrevOrigin,
    pub expansion: Vec<Word>,
}

/// The standard month abbreviations, always present.
const STD_MONTHS: &[(&str, &[&str])] = &[
    ("jan", &["january"]),
    ("feb", &["february"]),
    ("mar", &["march"]),
    ("apr", &["april"]),
    ("may", &["may"]),
    ("jun", &["june"]),
    ("jul", &["july"]),
    ("aug", &["august"]),
    ("sep", &["sept", "september"]),
    ("oct", &["october"]),
    ("nov", &["november"]),
    ("dec", &["december"]),
];

/// The standard journal abbreviations, matching plain.bst.
#[cfg(feature = "journal-abbrevs")]
const STD_JOURNALS: &[(&str, &[&str])] = &[
    ("acmcs", &["acm", "comput", "surv"]),
    ("acta", &["acta", "inform"]),
    ("cacm", &["commun", "acm"]),
    ("ibmjrd", &["ibm", "res", "develop"]),
    ("ibmsj", &["ibm", "syst"]),
    ("ieeese", &["ieee", "trans", "softw", "eng"]),
    ("ieeetc", &["ieee", "trans", "comput"]),
    (
        "ieeetcad",
        &["ieee", "trans", "comput", "aided", "design", "integrated", "circuits"],
    ),
    ("ipl", &["inform", "process", "lett"]),
    ("jacm", &["acm"]),
    ("jcss", &["comput", "syst", "sci"]),
    ("scp", &["sci", "comput", "program"]),
    ("sicomp", &["siam", "comput"]),
    ("tocs", &["acm", "trans", "comput", "syst"]),
    ("tods", &["acm", "trans", "database", "syst"]),
    ("tog", &["acm", "trans", "graph"]),
    ("toms", &["acm", "trans", "math", "softw"]),
    ("toois", &["acm", "trans", "office", "inform", "syst"]),
    ("toplas", &["acm", "trans", "program", "lang", "syst"]),
    ("tcs", &["theoret", "comput", "sci"]),
];

/// Dictionary from macro name to [`AbbrevCell`].
#[derive(Debug, Default)]
pub struct AbbrevTable {
    dict: Dict<AbbrevCell>,
}

impl AbbrevTable {
    /// An abbreviation table seeded with the built-in abbreviations.
    pub fn with_builtins() -> Self {
        let mut table = AbbrevTable { dict: Dict::new() };
        table.seed(STD_MONTHS);
        #[cfg(feature = "journal-abbrevs")]
        table.seed(STD_JOURNALS);
        table
    }

    fn seed(&mut self, set: &[(&str, &[&str])]) {
        for (name, expansion) in set {
            let cell = self
                .dict
                .entry_or_insert_with(&Word::from_str_lossy(name), || AbbrevCell {
                    origin: AbbrevOrigin::Undefined,
                    expansion: Vec::new(),
                });
            cell.origin = AbbrevOrigin::Builtin;
            cell.expansion = expansion
                .iter()
                .map(|w| Word::from_str_lossy(w))
                .collect();
        }
    }

    pub fn builtin_count() -> usize {
        #[cfg(feature = "journal-abbrevs")]
        {
            STD_MONTHS.len() + STD_JOURNALS.len()
        }
        #[cfg(not(feature = "journal-abbrevs"))]
        {
            STD_MONTHS.len()
        }
    }

    /// Record a definition at `entry`. Returns true if the name already
    /// had a definition (multiply-defined; callers warn).
    pub fn define(&mut self, name: &Word, entry: u32) -> bool {
        let cell = self.dict.entry_or_insert_with(name, || AbbrevCell {
            origin: AbbrevOrigin::Undefined,
            expansion: Vec::new(),
        });
        let redefined = cell.origin != AbbrevOrigin::Undefined;
        cell.origin = AbbrevOrigin::Entry(entry);
        redefined
    }

    /// Append a word to a definition's expansion.
    pub fn push_expansion(&mut self, name: &Word, word: Word) {
        if let Some(cell) = self.dict.get_mut(name) {
            cell.expansion.push(word);
        }
    }

    /// The cell for `name`, claiming an undefined forward-reference cell
    /// when the macro has not been seen yet.
    pub fn reference(&mut self, name: &Word) -> &AbbrevCell {
        self.dict.entry_or_insert_with(name, || AbbrevCell {
            origin: AbbrevOrigin::Undefined,
            expansion: Vec::new(),
        })
    }

    pub fn get(&self, name: &Word) -> Option<&AbbrevCell> {
        self.dict.get(name)
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Drain the abbreviations, sorted by name.
    pub fn into_sorted(self) -> Vec<(Word, AbbrevCell)> {
        self.dict.into_sorted()
    }
}

// ============================================================================
// STOP WORDS
// ============================================================================

/// Membership-only dictionary of words that are never indexed.
#[derive(Debug, Default)]
pub struct BadWordTable {
    dict: Dict<()>,
}

impl BadWordTable {
    /// The standard stop-word table.
    pub fn standard() -> Self {
        let mut table = BadWordTable { dict: Dict::new() };
        for word in crate::word::BAD_WORDS {
            table.dict.entry_or_insert_with(&Word::from_str_lossy(word), || ());
        }
        table
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.dict.contains(word)
    }
}

/// Is this a word worth indexing? Single characters and stop words are not.
pub fn is_indexable(word: &[u8], bad: &BadWordTable) -> bool {
    if word.len() < 2 {
        return false;
    }
    let (key, _) = Word::new(word);
    !bad.contains(&key)
}
