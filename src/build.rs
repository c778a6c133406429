// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The indexing pipeline: scan a `.bib` source, fill the per-field
//! dictionaries, and emit the sidecar.
//!
//! The driver walks the source entry by entry. Real entries and
//! `@string` definitions are assigned dense ids in source order and have
//! their offsets recorded; comments and preambles are skipped. Every
//! word of every field lands in that field's dictionary, compound words
//! contribute each component plus the concatenation, and macro
//! references contribute the macro name and its whole expansion.
//! `@string` definitions index their expansion under the synthetic
//! `@string` field, which is what makes `whatis` and searches over
//! abbreviations work.
//!
//! Parse problems are warnings, not errors: the offending entry is
//! abandoned and scanning resumes at the next `@`, which is more or less
//! what bibtex does. The warning total is reported at the end with an
//! advisory, because a sidecar built from a noisy source is usually
//! still usable.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use indicatif::{ProgressBar, ProgressStyle};

use crate::binary::writer::{write_sidecar, FieldStats};
use crate::dict::{is_indexable, AbbrevTable, BadWordTable, FieldTable};
use crate::lexer::{EntryKind, Scanner, ValueToken};
use crate::word::Word;

/// Name of the synthetic field holding abbreviation expansions.
const STRING_FIELD: &str = "@string";

/// Where the words of a field value are headed.
#[derive(Clone, Copy)]
enum Target {
    /// A real entry's field: insert into this field slot.
    Field(usize),
    /// An `@string` definition: insert into the `@string` field slot and
    /// record in the named abbreviation's expansion.
    Abbrev(usize, Word),
}

/// One indexing run's tables and counters.
pub struct Indexer {
    fields: FieldTable,
    abbrevs: AbbrevTable,
    badwords: BadWordTable,
    offsets: Vec<u32>,
}

/// Summary of a finished run.
pub struct IndexSummary {
    pub entries: usize,
    pub warnings: u32,
    pub stats: Vec<FieldStats>,
}

impl Indexer {
    pub fn new() -> Self {
        Indexer {
            fields: FieldTable::new(),
            abbrevs: AbbrevTable::with_builtins(),
            badwords: BadWordTable::standard(),
            offsets: Vec::new(),
        }
    }

    /// Mark a field as ignored before scanning begins.
    pub fn ignore_field(&mut self, name: &str) -> io::Result<()> {
        let (word, truncated) = Word::new(name.as_bytes());
        if truncated {
            eprintln!("warning: truncated field name: {}", word);
        }
        self.fields.make_black_hole(&word)
    }

    /// Scan the whole source, then serialize the sidecar into `out`.
    pub fn run<W: Write>(
        mut self,
        source: &[u8],
        source_mtime: SystemTime,
        out: &mut W,
        progress: Option<&ProgressBar>,
    ) -> io::Result<IndexSummary> {
        if source.len() > u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "source file too large for the sidecar offset table",
            ));
        }

        let mut sc = Scanner::new(source);
        while let Some(offset) = sc.find_next_entry() {
            let entry = self.offsets.len() as u32;
            if self.munge_entry(&mut sc, entry)? {
                self.offsets.push(offset as u32);
            }
            if let Some(pb) = progress {
                pb.set_position(sc.pos() as u64);
            }
        }

        let entries = self.offsets.len();
        let warnings = sc.warnings();
        let stats = write_sidecar(out, source_mtime, &self.offsets, self.fields, self.abbrevs)?;

        Ok(IndexSummary {
            entries,
            warnings,
            stats,
        })
    }

    /// Dispatch one entry by kind. Returns whether it consumed an id.
    fn munge_entry(&mut self, sc: &mut Scanner, entry: u32) -> io::Result<bool> {
        match sc.entry_kind()? {
            None | Some(EntryKind::Comment) => Ok(false),
            Some(EntryKind::Preamble) => {
                sc.skip_entry()?;
                Ok(false)
            }
            Some(EntryKind::StringDef) => {
                self.munge_abbrev(sc, entry)?;
                Ok(true)
            }
            Some(EntryKind::Real(_)) => {
                self.munge_real_entry(sc, entry)?;
                Ok(true)
            }
        }
    }

    /// Parse a real entry: citation key, then `name = value` fields.
    fn munge_real_entry(&mut self, sc: &mut Scanner, entry: u32) -> io::Result<()> {
        sc.skip_citation_key()?;

        let mut ch = sc.getc("reading citekey")?;
        while ch == b',' {
            ch = sc.getc("looking for field descriptor")?;
            while ch.is_ascii_whitespace() {
                ch = sc.getc("looking for field descriptor")?;
            }
            if ch == b'}' || ch == b')' {
                return Ok(()); // trailing comma before the close
            }
            if !crate::charclass::is_key_char(ch, true) {
                sc.warn(&format!(
                    "illegal character starting field descriptor: {:?}",
                    ch as char
                ));
                return Ok(());
            }
            sc.ungetc();

            let name = sc.read_identifier("reading field descriptor")?;
            let slot = self.fields.slot(&name)?;

            match sc.munge_field()? {
                None => return Ok(()), // warned; skip rest of entry
                Some(tokens) => self.apply_tokens(sc, Target::Field(slot), entry, tokens),
            }

            ch = sc.getc("trying to read comma or close brace")?;
        }
        Ok(())
    }

    /// Parse an `@string` definition.
    fn munge_abbrev(&mut self, sc: &mut Scanner, entry: u32) -> io::Result<()> {
        let mut ch = sc.getc("looking for abbreviation")?;
        while ch.is_ascii_whitespace() {
            ch = sc.getc("looking for abbreviation")?;
        }
        if !crate::charclass::is_key_char(ch, true) {
            sc.warn(&format!(
                "illegal character starting abbreviation: {:?}",
                ch as char
            ));
            return Ok(());
        }
        sc.ungetc();

        let name = sc.read_identifier("reading abbreviation")?;
        let slot = self.fields.slot(&Word::from_str_lossy(STRING_FIELD))?;

        if self.abbrevs.define(&name, entry) {
            sc.warn(&format!("multiply-defined abbreviation: {}", name));
        }

        if let Some(tokens) = sc.munge_field()? {
            self.apply_tokens(sc, Target::Abbrev(slot, name), entry, tokens);
        }
        sc.getc("trying to read close brace")?;
        Ok(())
    }

    /// Feed one field value's tokens into the dictionaries.
    fn apply_tokens(&mut self, sc: &mut Scanner, target: Target, entry: u32, tokens: Vec<ValueToken>) {
        for token in tokens {
            match token {
                ValueToken::Word(bytes) | ValueToken::Number(bytes) => {
                    self.emit(sc, target, entry, &bytes);
                }
                ValueToken::Compound(components) => {
                    let mut joined = Vec::new();
                    for component in &components {
                        self.emit(sc, target, entry, component);
                        joined.extend_from_slice(component);
                    }
                    self.emit(sc, target, entry, &joined);
                }
                ValueToken::Macro(name) => {
                    self.emit(sc, target, entry, name.as_bytes());
                    let (origin, expansion) = {
                        let cell = self.abbrevs.reference(&name);
                        (cell.origin, cell.expansion.clone())
                    };
                    if origin == crate::dict::AbbrevOrigin::Undefined {
                        sc.warn(&format!("undefined abbreviation: {}", name));
                    }
                    for word in expansion {
                        self.emit(sc, target, entry, word.as_bytes());
                    }
                }
            }
        }
    }

    /// Insert one word for `entry`, applying the stop-word filter and
    /// truncation warning.
    fn emit(&mut self, sc: &mut Scanner, target: Target, entry: u32, bytes: &[u8]) {
        if !is_indexable(bytes, &self.badwords) {
            return;
        }
        let (word, truncated) = Word::new(bytes);
        if truncated {
            sc.warn(&format!("truncated word: {}", word));
        }
        match target {
            Target::Field(slot) => self.fields.insert(slot, &word, entry),
            Target::Abbrev(slot, ref name) => {
                self.fields.insert(slot, &word, entry);
                self.abbrevs.push_expansion(name, word);
            }
        }
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FILE-LEVEL DRIVER
// ============================================================================

/// Index `source_path` into `sidecar_path`, with progress feedback and
/// the per-field statistics table on stdout.
pub fn index_file(source_path: &Path, sidecar_path: &Path, ignored: &[String]) -> io::Result<()> {
    let source = fs::read(source_path).map_err(|e| {
        io::Error::new(e.kind(), format!("can't read {}: {}", source_path.display(), e))
    })?;
    let source_mtime = fs::metadata(source_path)?.modified()?;

    let mut indexer = Indexer::new();
    for field in ignored {
        indexer.ignore_field(field)?;
    }

    let pb = ProgressBar::new(source.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:<9} [{bar:40.cyan/dim}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━╸"),
    );
    pb.set_prefix("Indexing");
    pb.set_message(
        source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );

    let out = fs::File::create(sidecar_path).map_err(|e| {
        io::Error::new(e.kind(), format!("can't write {}: {}", sidecar_path.display(), e))
    })?;
    let mut out = BufWriter::new(out);
    let summary = indexer.run(&source, source_mtime, &mut out, Some(&pb))?;
    out.flush()?;

    pb.finish_with_message(format!("{} entries", summary.entries));

    print_stats(&summary);
    if summary.warnings > 0 {
        println!();
        println!("Warning: {} problems were encountered.", summary.warnings);
        println!("\t The sidecar may still be usable.");
    }
    Ok(())
}

fn print_stats(summary: &IndexSummary) {
    println!("{} fields", summary.stats.len());
    let mut total_words = 0usize;
    let mut total_refs = 0usize;
    for (i, field) in summary.stats.iter().enumerate() {
        let per_word = field.refs as f64 / if field.words == 0 { 1.0 } else { field.words as f64 };
        println!(
            "{:3}. {:<12} {:6} words, {:8} refs, {:6.2} refs/word",
            i + 1,
            field.name.as_str(),
            field.words,
            field.refs,
            per_word
        );
        total_words += field.words;
        total_refs += field.refs;
    }
    println!(
        "--- TOTAL ---    {:6} words, {:8} refs, {:6.2} refs/word",
        total_words,
        total_refs,
        total_refs as f64 / if total_words == 0 { 1.0 } else { total_words as f64 }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    /// Index a source string entirely in memory.
    fn index(source: &str) -> (Vec<u8>, IndexSummary) {
        let mut out = Vec::new();
        let summary = Indexer::new()
            .run(source.as_bytes(), UNIX_EPOCH, &mut out, None)
            .unwrap();
        (out, summary)
    }

    #[test]
    fn counts_real_and_string_entries() {
        let source = "\
@article{a, title = {Alpha}}

@string{foo = \"Fast Algorithms\"}

@comment{this is not an entry}

@preamble{\"\\def\\x{y}\"}

@book{b, title = {Beta}}
";
        let (_, summary) = index(source);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.warnings, 0);
    }

    #[test]
    fn field_stats_count_words_and_refs() {
        let source = "\
@article{a, title = {Voronoi Diagrams}}

@article{b, title = {Voronoi Methods}}
";
        let (_, summary) = index(source);
        let title = summary
            .stats
            .iter()
            .find(|s| s.name.as_str() == "title")
            .unwrap();
        assert_eq!(title.words, 3); // voronoi, diagrams, methods
        assert_eq!(title.refs, 4);
    }

    #[test]
    fn undefined_abbreviation_warns() {
        let source = "@article{a, journal = mystery}\n";
        let (_, summary) = index(source);
        assert_eq!(summary.warnings, 1);
    }

    #[test]
    fn multiply_defined_abbreviation_warns() {
        let source = "\
@string{cgta = \"Comput Geom Theory Appl\"}

@string{cgta = \"Computational Geometry\"}
";
        let (_, summary) = index(source);
        assert_eq!(summary.warnings, 1);
    }

    #[test]
    fn bad_entry_is_skipped_and_scanning_resumes() {
        let source = "\
@article{broken, title = = nope}

@article{good, title = {Fine}}
";
        let (_, summary) = index(source);
        assert!(summary.warnings > 0);
        // The broken entry still claimed an id before failing; the good
        // one parsed.
        assert_eq!(summary.entries, 2);
    }
}
