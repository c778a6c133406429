// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The query evaluator: field resolution, word lookup, boolean
//! composition, and record display.
//!
//! A lookup session owns the loaded sidecar, the posting cache, and the
//! open source and sidecar files. Queries accumulate into bitsets:
//! `results` is the running answer, `oldresults` holds the previous
//! statement for `and`/`or`, `oneword` collects every posting list a
//! single term touched (a pattern can hit many words), and `onefield` is
//! scratch for one decompressed list.
//!
//! Words are found by binary searching each active field's sorted word
//! list for the term's literal prefix, then scanning forward while the
//! prefix still holds - with a tolerance of a few mismatching neighbours
//! - testing the full pattern against each candidate. A term with no
//! wildcards is just a pattern that happens to match exactly one way.
//!
//! Display copies records verbatim from the source file: seek to the
//! entry's offset, skip to the `@`, and copy through the balanced
//! closing delimiter, quote- and brace-aware. The destination is any
//! `io::Write`; callers point it at stdout or a save file.

pub mod pattern;

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::binary::header::{INDEX_BUILTIN, INDEX_NAN, MAJOR_VERSION, MINOR_VERSION};
use crate::binary::{uncompress_refs, Sidecar};
use crate::bitset::EntrySet;
use crate::cache::PostingCache;
use crate::word::BAD_WORDS;

use self::pattern::{literal_prefix, matches, MAX_PATTERN};

/// Neighbours allowed to miss the literal prefix before a scan stops.
const SCAN_TOLERANCE: usize = 3;

/// An interactive lookup session over one bibliography.
pub struct LookupSession<S: Read + Seek> {
    sidecar: Sidecar,
    cache: PostingCache,
    bib: S,
    bix: S,
    results: EntrySet,
    oldresults: EntrySet,
    oneword: EntrySet,
    onefield: EntrySet,
    first_field: usize,
    last_field: usize,
}

impl<S: Read + Seek> LookupSession<S> {
    /// Build a session from a loaded sidecar and the two open files.
    pub fn new(sidecar: Sidecar, bib: S, bix: S) -> Self {
        let universe = sidecar.num_entries();
        let mut session = LookupSession {
            sidecar,
            cache: PostingCache::new(),
            bib,
            bix,
            results: EntrySet::new(universe),
            oldresults: EntrySet::new(universe),
            oneword: EntrySet::new(universe),
            onefield: EntrySet::new(universe),
            first_field: 0,
            last_field: 0,
        };
        session.clear_results();
        session
    }

    pub fn num_entries(&self) -> usize {
        self.sidecar.num_entries()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.sidecar.fields.iter().map(|f| f.name.as_str())
    }

    // ========================================================================
    // RESULT SET MANAGEMENT
    // ========================================================================

    /// Start a fresh query: everything matches until a term filters it.
    pub fn clear_results(&mut self) {
        self.results.fill();
        self.oldresults.copy_from(&self.results);
    }

    /// Stash the current results and start fresh, for `and`/`or`.
    pub fn save_results(&mut self) {
        self.oldresults.copy_from(&self.results);
        self.results.fill();
    }

    /// Fold the current primitive into the accumulated results.
    pub fn combine_results(&mut self, invert: bool, intersect: bool) {
        if invert {
            self.results.complement();
        }
        if intersect {
            self.results.intersect_with(&self.oldresults);
        } else {
            self.results.union_with(&self.oldresults);
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.count()
    }

    /// The matched entry ids, ascending.
    pub fn result_ids(&self) -> Vec<usize> {
        self.results.iter().collect()
    }

    /// Print the match-count summary after a statement.
    pub fn report_results(&self) {
        match self.results.count() {
            0 => println!("\tNo matches found."),
            1 => println!("\t1 match found."),
            n => println!("\t{} matches found.", n),
        }
    }

    // ========================================================================
    // FIELD RESOLUTION
    // ========================================================================

    /// Activate every field whose name starts with `prefix`. Field names
    /// are sorted, so the matches form a contiguous range. An empty
    /// prefix (the `-` form, stripped of non-alphanumerics) matches all
    /// fields. Returns the number of active fields; zero prints a notice.
    pub fn set_up_field(&mut self, prefix: &str) -> usize {
        let mut first = None;
        let mut last = 0;
        for (i, field) in self.sidecar.fields.iter().enumerate() {
            if field.name.starts_with(prefix.as_bytes()) {
                if first.is_none() {
                    first = Some(i);
                }
                last = i;
            }
        }
        match first {
            None => {
                println!("\tNo searchable fields matching \"{}\".", prefix);
                0
            }
            Some(first) => {
                self.first_field = first;
                self.last_field = last;
                last - first + 1
            }
        }
    }

    // ========================================================================
    // WORD SEARCH
    // ========================================================================

    /// Search the active fields for one term and intersect the hits into
    /// the running results. `prefix` is set when the original token ended
    /// with `*`.
    pub fn find_word(&mut self, word: &str, prefix: bool) -> io::Result<()> {
        let term = word.as_bytes();

        if !prefix {
            if term.is_empty() {
                println!("\t[ignoring empty string]");
                return Ok(());
            }
            if term.len() == 1 {
                println!("\t[ignoring single letter \"{}\"]", word);
                return Ok(());
            }
            if BAD_WORDS.contains(&word) {
                println!("\t[ignoring common word \"{}\"]", word);
                return Ok(());
            }
        }
        if term.len() >= MAX_PATTERN {
            println!("\t[pattern too long: \"{}\"]", word);
            return Ok(());
        }

        self.oneword.clear();
        let lit = literal_prefix(term).to_vec();

        for field in self.first_field..=self.last_field {
            let lower = self.sidecar.fields[field]
                .words
                .partition_point(|iw| iw.word.as_bytes() < lit.as_slice());

            let mut misses = 0;
            for idx in lower..self.sidecar.fields[field].words.len() {
                let candidate = self.sidecar.fields[field].words[idx].word;
                if !candidate.starts_with(&lit) {
                    misses += 1;
                    if misses > SCAN_TOLERANCE {
                        break;
                    }
                }
                if matches(term, candidate.as_bytes()) {
                    self.add_postings(field, idx)?;
                }
            }
        }

        self.results.intersect_with(&self.oneword);
        Ok(())
    }

    /// Fault in one word's postings and union them into `oneword`.
    fn add_postings(&mut self, field: usize, word: usize) -> io::Result<()> {
        self.cache
            .access(&mut self.sidecar.fields, field, word, &mut self.bix)?;
        let refs = &self.sidecar.fields[field].words[word].refs;
        let data = refs.data.as_deref().unwrap_or(&[]);
        let ids = uncompress_refs(data, refs.length as usize)?;
        self.onefield.assign(&ids);
        self.oneword.union_with(&self.onefield);
        Ok(())
    }

    // ========================================================================
    // DISPLAY
    // ========================================================================

    /// Copy one entry verbatim from the source: from its `@` through the
    /// balanced closing delimiter, quote-aware.
    pub fn print_entry<W: Write>(&mut self, entry: usize, out: &mut W) -> io::Result<()> {
        if entry >= self.sidecar.num_entries() {
            return Ok(()); // extra bits beyond the universe
        }

        out.write_all(b"\n")?;
        self.bib
            .seek(SeekFrom::Start(u64::from(self.sidecar.offsets[entry])))?;

        let mut ch = read_byte(&mut self.bib)?;
        while ch != b'@' {
            ch = read_byte(&mut self.bib)?;
        }
        while ch != b'{' && ch != b'(' {
            out.write_all(&[ch])?;
            ch = read_byte(&mut self.bib)?;
        }

        let mut braces: u32 = 0;
        let mut quotes = false;
        out.write_all(&[ch])?;
        ch = read_byte(&mut self.bib)?;
        while quotes || braces > 0 || (ch != b'}' && ch != b')') {
            if ch == b'{' {
                braces += 1;
            } else if ch == b'}' {
                braces = braces.saturating_sub(1);
            } else if ch == b'"' && braces == 0 {
                quotes = !quotes;
            }
            out.write_all(&[ch])?;
            ch = read_byte(&mut self.bib)?;
        }
        out.write_all(&[ch])?;
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Print every matched entry, in ascending id order, into `out`.
    /// `stamp` adds the provenance comment used for save files.
    pub fn print_results<W: Write>(&mut self, out: &mut W, stamp: bool) -> io::Result<()> {
        if self.results.count() == 0 {
            println!("\tNothing to display!");
            return Ok(());
        }
        if stamp {
            writeln!(
                out,
                "% Retrieved by biblook {}.{}",
                MAJOR_VERSION, MINOR_VERSION
            )?;
        }
        let ids: Vec<usize> = self.results.iter().collect();
        for id in ids {
            self.print_entry(id, out)?;
        }
        out.flush()
    }

    // ========================================================================
    // WHATIS
    // ========================================================================

    /// Look up an abbreviation and display its definition.
    pub fn display_abbrev<W: Write>(&mut self, name: &str, out: &mut W) -> io::Result<()> {
        let found = self
            .sidecar
            .abbrevs
            .binary_search_by(|abbrev| abbrev.as_bytes().cmp(name.as_bytes()));

        match found {
            Err(_) => {
                println!("\tThe abbreviation \"{}\" is not defined.", name);
            }
            Ok(idx) => match self.sidecar.abbrev_locs[idx] {
                INDEX_BUILTIN => {
                    println!("\tThe abbreviation \"{}\" is builtin.", name);
                }
                INDEX_NAN => {
                    println!("\tThe abbreviation \"{}\" is not defined.", name);
                }
                entry => {
                    self.print_entry(entry as usize, out)?;
                    out.flush()?;
                }
            },
        }
        Ok(())
    }
}

fn read_byte<S: Read>(source: &mut S) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    source.read_exact(&mut byte).map_err(|_| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "bibliography file is shorter than its sidecar claims",
        )
    })?;
    Ok(byte[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::writer::write_sidecar;
    use crate::dict::{AbbrevTable, FieldTable};
    use crate::word::Word;
    use std::io::Cursor;
    use std::time::UNIX_EPOCH;

    fn word(s: &str) -> Word {
        Word::from_str_lossy(s)
    }

    /// Three entries: author=erdos in {0,1}, title=voronoi in {1,2},
    /// title=algorithmic in {0}.
    fn session() -> LookupSession<Cursor<Vec<u8>>> {
        let source = b"@article{a,}\n\n@article{b,}\n\n@article{c,}\n".to_vec();
        let mut fields = FieldTable::new();
        let author = fields.slot(&word("author")).unwrap();
        let title = fields.slot(&word("title")).unwrap();
        fields.insert(author, &word("erdos"), 0);
        fields.insert(author, &word("erdos"), 1);
        fields.insert(title, &word("voronoi"), 1);
        fields.insert(title, &word("voronoi"), 2);
        fields.insert(title, &word("algorithmic"), 0);

        let mut bix = Vec::new();
        write_sidecar(
            &mut bix,
            UNIX_EPOCH,
            &[0, 14, 28],
            fields,
            AbbrevTable::default(),
        )
        .unwrap();

        let sidecar = Sidecar::load(&mut Cursor::new(&bix)).unwrap();
        LookupSession::new(sidecar, Cursor::new(source), Cursor::new(bix))
    }

    fn ids(session: &LookupSession<Cursor<Vec<u8>>>) -> Vec<usize> {
        session.results.iter().collect()
    }

    #[test]
    fn single_term_search() {
        let mut s = session();
        s.clear_results();
        assert_eq!(s.set_up_field("au"), 1);
        s.find_word("erdos", false).unwrap();
        assert_eq!(ids(&s), vec![0, 1]);
    }

    #[test]
    fn empty_field_prefix_searches_all_fields() {
        let mut s = session();
        s.clear_results();
        assert_eq!(s.set_up_field(""), 2);
        s.find_word("voronoi", false).unwrap();
        assert_eq!(ids(&s), vec![1, 2]);
    }

    #[test]
    fn and_not_composition() {
        let mut s = session();
        // find au erdos & ~t voronoi
        s.clear_results();
        s.set_up_field("au");
        s.find_word("erdos", false).unwrap();
        s.combine_results(false, true);
        s.save_results();
        s.set_up_field("t");
        s.find_word("voronoi", false).unwrap();
        s.combine_results(true, true);
        assert_eq!(ids(&s), vec![0]);
    }

    #[test]
    fn or_composition() {
        let mut s = session();
        s.clear_results();
        s.set_up_field("t");
        s.find_word("algorithmic", false).unwrap();
        s.combine_results(false, true);
        s.save_results();
        s.set_up_field("t");
        s.find_word("voronoi", false).unwrap();
        s.combine_results(false, false);
        assert_eq!(ids(&s), vec![0, 1, 2]);
    }

    #[test]
    fn trailing_star_is_a_prefix_search() {
        let mut s = session();
        s.clear_results();
        s.set_up_field("t");
        s.find_word("algo*", true).unwrap();
        s.combine_results(false, true);
        assert_eq!(ids(&s), vec![0]);
    }

    #[test]
    fn stop_words_are_ignored_without_narrowing() {
        let mut s = session();
        s.clear_results();
        s.set_up_field("t");
        s.find_word("the", false).unwrap();
        s.combine_results(false, true);
        // Ignored term leaves the full universe.
        assert_eq!(ids(&s), vec![0, 1, 2]);
    }

    #[test]
    fn unknown_word_empties_results() {
        let mut s = session();
        s.clear_results();
        s.set_up_field("t");
        s.find_word("nonexistent", false).unwrap();
        s.combine_results(false, true);
        assert_eq!(ids(&s), Vec::<usize>::new());
    }

    #[test]
    fn print_entry_copies_balanced_record() {
        let mut s = session();
        let mut out = Vec::new();
        s.print_entry(1, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n@article{b,}\n");
    }
}
