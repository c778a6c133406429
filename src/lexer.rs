// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The BibTeX lexer: entry discovery, field lexing, and word extraction.
//!
//! The scanner walks the source bytes with one byte of pushback, tracking
//! the current line and the line the current entry began on, so warnings
//! can point somewhere useful. It does not try to be a full BibTeX
//! implementation; it agrees with bibtex on the cases that matter for
//! indexing and recovers from everything else by skipping to the next `@`.
//!
//! Entry discovery deliberately keys on blank lines: an entry officially
//! begins just after the most recent blank line (or the close of the
//! previous entry, or the start of the file), so "comments" that obviously
//! belong to an entry stay attached to it.
//!
//! One quirk is load-bearing: after recognizing the kind name `comment`,
//! the parser returns without consuming the opening delimiter. That is
//! what bibtex.web section 241 does, so the same files misbehave in the
//! same ways.

use std::io;

use crate::charclass::is_key_char;
use crate::word::{Word, MAX_COMPOUND, MAX_WORD};

/// What kind of entry follows an `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A real bibliographic record (`@article`, `@book`, ...).
    Real(Word),
    /// `@string` abbreviation definition.
    StringDef,
    /// `@comment`; nothing is consumed, not even the delimiter.
    Comment,
    /// `@preamble`; skipped as a balanced group.
    Preamble,
}

/// One fragment of a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueToken {
    /// A simple word (already lower-cased).
    Word(Vec<u8>),
    /// A compound word: its components, in order.
    Compound(Vec<Vec<u8>>),
    /// A bare digit run.
    Number(Vec<u8>),
    /// A macro reference.
    Macro(Word),
}

/// Cursor over the source bytes with one-byte pushback and line tracking.
pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u64,
    entry_line: u64,
    warnings: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Scanner {
            bytes,
            pos: 0,
            line: 1,
            entry_line: 1,
            warnings: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// Print a warning with the current line number and count it.
    pub fn warn(&mut self, msg: &str) {
        eprintln!("warning: {} (at line {})", msg, self.line);
        self.warnings += 1;
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    /// Next byte, or a fatal error naming what we were doing. Used by
    /// routines that must not run into end of file.
    pub fn getc(&mut self, what: &str) -> io::Result<u8> {
        self.next_byte().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "unexpected end of file while {} (in entry starting at line {})",
                    what, self.entry_line
                ),
            )
        })
    }

    /// Push the last byte back into the stream.
    pub fn ungetc(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
        if self.bytes[self.pos] == b'\n' {
            self.line -= 1;
        }
    }

    // ========================================================================
    // ENTRY DISCOVERY
    // ========================================================================

    /// Find the next entry and return its source offset, leaving the
    /// cursor just after the `@`. The entry begins at the most recent
    /// blank line, the close of the previous entry, or the start of the
    /// file. Returns `None` at end of input.
    pub fn find_next_entry(&mut self) -> Option<usize> {
        let mut offset = self.pos;
        let mut ch = self.next_byte()?;
        if ch == b'\n' {
            offset += 1;
        }
        self.entry_line = self.line;

        let mut blank = false;
        loop {
            if ch == b'@' {
                return Some(offset);
            } else if ch == b'\n' {
                if blank {
                    offset = self.pos;
                    self.entry_line = self.line;
                }
                blank = true;
            } else if !ch.is_ascii_whitespace() {
                blank = false;
            }
            ch = self.next_byte()?;
        }
    }

    /// Read the entry kind after `@`. Returns `None` (after a warning) on
    /// a parse error; the caller resynchronizes at the next `@`.
    pub fn entry_kind(&mut self) -> io::Result<Option<EntryKind>> {
        let mut ch = self.getc("looking for entry type")?;
        while ch.is_ascii_whitespace() {
            ch = self.getc("looking for entry type")?;
        }

        if !ch.is_ascii_alphabetic() {
            self.warn(&format!("letter expected after @: {:?}", ch as char));
            self.skipping_entry();
            return Ok(None);
        }

        let mut name = Vec::new();
        let mut first = true;
        while is_key_char(ch, first) {
            if name.len() >= MAX_WORD {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "record name buffer overflow at line {}",
                        self.line
                    ),
                ));
            }
            name.push(ch.to_ascii_lowercase());
            first = false;
            ch = self.getc("recording entry type")?;
        }

        if name == b"comment" {
            // Leave the delimiter (and everything else) in the stream.
            self.ungetc();
            return Ok(Some(EntryKind::Comment));
        }

        while ch.is_ascii_whitespace() {
            ch = self.getc("looking for open brace")?;
        }
        if ch != b'{' && ch != b'(' {
            self.warn(&format!("{{ or ( expected after entry type: {:?}", ch as char));
            self.skipping_entry();
            return Ok(None);
        }

        Ok(Some(match name.as_slice() {
            b"string" => EntryKind::StringDef,
            b"preamble" => EntryKind::Preamble,
            _ => EntryKind::Real(Word::new(&name).0),
        }))
    }

    /// Skip a balanced brace/paren group, quote-aware. Used for
    /// `@preamble`.
    pub fn skip_entry(&mut self) -> io::Result<()> {
        let mut braces: u32 = 0;
        let mut quotes = false;
        let mut ch = self.getc("skipping entry")?;
        while quotes || braces > 0 || (ch != b'}' && ch != b')') {
            if ch == b'{' {
                braces += 1;
            } else if ch == b'}' {
                braces = braces.saturating_sub(1);
            } else if ch == b'"' && braces == 0 {
                quotes = !quotes;
            }
            ch = self.getc("skipping entry")?;
        }
        Ok(())
    }

    /// Read the citation key of a real entry (anything up to the comma).
    pub fn skip_citation_key(&mut self) -> io::Result<()> {
        let mut ch = self.getc("looking for citekey")?;
        while ch.is_ascii_whitespace() {
            ch = self.getc("looking for citekey")?;
        }
        // Pretty much anything can go in a bibtex key, including braces,
        // parens, quotes, and chars that are illegal anywhere else.
        while ch != b',' {
            ch = self.getc("reading citekey")?;
        }
        self.ungetc();
        Ok(())
    }

    /// Read one identifier (field name, abbreviation), lower-cased, with
    /// the lookahead byte pushed back. The identifier must fit a [`Word`];
    /// overflowing the buffer is fatal, as it was for bibtex.
    pub fn read_identifier(&mut self, what: &str) -> io::Result<Word> {
        let mut ch = self.getc(what)?;
        let mut name = Vec::new();
        let mut first = true;
        while is_key_char(ch, first) {
            if name.len() >= MAX_WORD {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("identifier buffer overflow at line {}", self.line),
                ));
            }
            name.push(ch.to_ascii_lowercase());
            first = false;
            ch = self.getc(what)?;
        }
        self.ungetc();
        Ok(Word::new(&name).0)
    }

    fn skipping_entry(&mut self) {
        eprintln!("\t(skipping the rest of this entry)");
    }

    // ========================================================================
    // FIELD VALUES
    // ========================================================================

    /// Lex the value after a field name: `= fragment (# fragment)*`.
    ///
    /// On entry the cursor is just after the field name. On success the
    /// terminator (`,`, `}`, or `)`) is pushed back and the fragments are
    /// returned; on a parse error a warning is issued and `None` comes
    /// back, telling the caller to abandon the entry.
    pub fn munge_field(&mut self) -> io::Result<Option<Vec<ValueToken>>> {
        let mut ch = self.getc("looking for =")?;
        while ch.is_ascii_whitespace() {
            ch = self.getc("looking for =")?;
        }
        if ch != b'=' {
            self.warn(&format!("= expected after field name: {:?}", ch as char));
            return Ok(None);
        }

        let mut tokens = Vec::new();
        loop {
            let mut ch = self.getc("looking for open quote/brace")?;
            while ch.is_ascii_whitespace() {
                ch = self.getc("looking for open quote/brace")?;
            }

            if ch == b'{' || ch == b'"' {
                loop {
                    let components = self.next_word()?;
                    match components.len() {
                        0 => break,
                        1 => tokens.push(ValueToken::Word(
                            components.into_iter().next().unwrap_or_default(),
                        )),
                        _ => tokens.push(ValueToken::Compound(components)),
                    }
                }
                self.getc("reading close quote/brace")?;
                ch = self.getc("looking for comma or close brace")?;
            } else if ch.is_ascii_digit() {
                let mut digits = Vec::new();
                while ch.is_ascii_digit() {
                    if digits.len() >= MAX_WORD {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("word buffer overflow at line {}", self.line),
                        ));
                    }
                    digits.push(ch);
                    ch = self.getc("reading number")?;
                }
                tokens.push(ValueToken::Number(digits));
            } else if is_key_char(ch, true) {
                self.ungetc();
                let name = self.read_identifier("reading abbreviation")?;
                ch = self.getc("looking for comma, close brace, or #")?;
                tokens.push(ValueToken::Macro(name));
            } else {
                self.warn(&format!("illegal character after =: {:?}", ch as char));
                return Ok(None);
            }

            while ch.is_ascii_whitespace() {
                ch = self.getc("looking for comma, close brace, or #")?;
            }

            if ch == b',' || ch == b'}' || ch == b')' {
                self.ungetc();
                return Ok(Some(tokens));
            } else if ch == b'#' {
                continue;
            } else {
                self.warn(&format!(
                    "expected }} or , or # after field string: {:?}",
                    ch as char
                ));
                return Ok(None);
            }
        }
    }

    // ========================================================================
    // WORD EXTRACTION
    // ========================================================================

    /// Extract the next word from a brace- or quote-delimited field
    /// string. A word is a list of components: `half-space` comes back as
    /// `["half", "space"]`, `{van Dam}` as `["van", "dam"]`, and
    /// `$\Omega(n\log n)$` as `["omega", "n", "log", "n"]`. An empty list
    /// means the field string is exhausted (its closing delimiter has
    /// been pushed back).
    ///
    /// Letters fold to lower case; TeX control words vanish but leave
    /// their arguments (`Erd{\H o}s` becomes `erdos`); `'`, `[`, `]` are
    /// dropped (`O'Rourke` becomes `orourke`, `J[ohn]` becomes `john`);
    /// `$` toggles math mode, where any run of non-alphanumerics
    /// separates components. Total length is bounded; overflow truncates
    /// with a warning.
    pub fn next_word(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let mut components: Vec<Vec<u8>> = Vec::new();
        let mut braces: u32 = 0;
        let mut math = false;
        let mut incmd = false;
        let mut between = true;
        let mut nchars: usize = 0;

        loop {
            let ch = self.getc("reading next word")?;

            if !ch.is_ascii() {
                self.warn(&format!("nonascii char, ignoring: \\{:03o}", ch));
            } else if ch.is_ascii_alphabetic() {
                if !incmd {
                    if between {
                        components.push(Vec::new());
                        between = false;
                    }
                    nchars += 1;
                    if nchars <= MAX_COMPOUND {
                        if let Some(comp) = components.last_mut() {
                            comp.push(ch.to_ascii_lowercase());
                        }
                    }
                }
            } else if ch.is_ascii_digit() {
                incmd = false;
                if between {
                    components.push(Vec::new());
                    between = false;
                }
                nchars += 1;
                if nchars <= MAX_COMPOUND {
                    if let Some(comp) = components.last_mut() {
                        comp.push(ch);
                    }
                }
            } else if math {
                if ch == b'$' {
                    math = false;
                    braces = braces.saturating_sub(1);
                } else if !between {
                    nchars += 1;
                    between = true;
                }
            } else if ch == b'\\' {
                let next = self.getc("reading next word")?;
                if next.is_ascii_alphabetic() {
                    incmd = true;
                }
                // A non-alphabetic escape (\&, \_) is consumed as a
                // literal and contributes nothing.
            } else if ch == b'{' {
                incmd = false;
                braces += 1;
            } else if ch == b'}' {
                incmd = false;
                if braces == 0 {
                    self.ungetc();
                    break;
                }
                braces -= 1;
            } else if ch == b'"' {
                incmd = false;
                if braces == 0 {
                    self.ungetc();
                    break;
                }
            } else if ch == b'$' {
                incmd = false;
                math = true;
                braces += 1;
            } else if ch == b'-' && !between {
                nchars += 1;
                between = true;
            } else if ch.is_ascii_whitespace() && braces > 0 {
                if incmd {
                    incmd = false;
                } else if !between {
                    nchars += 1;
                    between = true;
                }
            } else if incmd {
                incmd = false;
            } else if ch == b'\'' || ch == b'[' || ch == b']' {
                // dropped silently
            } else if !components.is_empty() && braces == 0 {
                break;
            }

            if nchars > MAX_COMPOUND {
                self.warn("overflowed compound word buffer, truncating");
                break;
            }
        }

        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_of(field: &str) -> Vec<Vec<String>> {
        // Feed the scanner the inside of a braced field string.
        let source = format!("{}}}", field);
        let mut sc = Scanner::new(source.as_bytes());
        let mut out = Vec::new();
        loop {
            let components = sc.next_word().unwrap();
            if components.is_empty() {
                break;
            }
            out.push(
                components
                    .into_iter()
                    .map(|c| String::from_utf8(c).unwrap())
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn simple_words_fold_case() {
        assert_eq!(words_of("Voronoi Diagrams"), vec![vec!["voronoi"], vec!["diagrams"]]);
    }

    #[test]
    fn hyphen_makes_compound() {
        assert_eq!(words_of("half-space"), vec![vec!["half", "space"]]);
    }

    #[test]
    fn double_hyphen_splits_words() {
        assert_eq!(words_of("18--21"), vec![vec!["18"], vec!["21"]]);
    }

    #[test]
    fn tex_accent_is_stripped() {
        assert_eq!(words_of("Erd{\\H o}s"), vec![vec!["erdos"]]);
    }

    #[test]
    fn apostrophes_and_brackets_vanish() {
        assert_eq!(words_of("O'Rourke"), vec![vec!["orourke"]]);
        assert_eq!(words_of("J[ohn]"), vec![vec!["john"]]);
    }

    #[test]
    fn braced_whitespace_makes_compound() {
        assert_eq!(words_of("{van Dam}"), vec![vec!["van", "dam"]]);
    }

    #[test]
    fn math_mode_splits_on_punctuation() {
        assert_eq!(
            words_of("$\\Omega(n\\log n)$"),
            vec![vec!["omega", "n", "log", "n"]]
        );
    }

    #[test]
    fn entry_discovery_uses_blank_lines() {
        let source = b"stray text\n\n  leading comment\n@article{x,\n";
        let mut sc = Scanner::new(source);
        let offset = sc.find_next_entry().unwrap();
        // The entry starts after the blank line, at the attached comment.
        assert_eq!(offset, 12);
    }

    #[test]
    fn comment_leaves_delimiter_in_stream() {
        let source = b"comment{ not parsed }";
        let mut sc = Scanner::new(source);
        let kind = sc.entry_kind().unwrap().unwrap();
        assert_eq!(kind, EntryKind::Comment);
        assert_eq!(sc.pos(), 7, "delimiter must not be consumed");
    }

    #[test]
    fn entry_kind_dispatch() {
        let mut sc = Scanner::new(b"string{foo = \"bar\"}");
        assert_eq!(sc.entry_kind().unwrap().unwrap(), EntryKind::StringDef);

        let mut sc = Scanner::new(b"preamble{\"\\def\\x{y}\"}");
        assert_eq!(sc.entry_kind().unwrap().unwrap(), EntryKind::Preamble);

        let mut sc = Scanner::new(b"Article{key,");
        match sc.entry_kind().unwrap().unwrap() {
            EntryKind::Real(kind) => assert_eq!(kind.as_str(), "article"),
            other => panic!("expected real entry, got {:?}", other),
        }
    }

    #[test]
    fn munge_field_concatenation_and_macros() {
        let mut sc = Scanner::new(b" = \"Proc.\" # fancy # {half-space Symp},");
        let tokens = sc.munge_field().unwrap().unwrap();
        assert_eq!(
            tokens,
            vec![
                ValueToken::Word(b"proc".to_vec()),
                ValueToken::Macro(Word::from_str_lossy("fancy")),
                ValueToken::Compound(vec![b"half".to_vec(), b"space".to_vec()]),
                ValueToken::Word(b"symp".to_vec()),
            ]
        );
    }

    #[test]
    fn munge_field_numbers() {
        let mut sc = Scanner::new(b" = 1987 ,");
        let tokens = sc.munge_field().unwrap().unwrap();
        assert_eq!(tokens, vec![ValueToken::Number(b"1987".to_vec())]);
    }

    #[test]
    fn munge_field_rejects_garbage() {
        let mut sc = Scanner::new(b" = } ,");
        assert!(sc.munge_field().unwrap().is_none());
        assert_eq!(sc.warnings(), 1);
    }

    #[test]
    fn preamble_skip_is_quote_aware() {
        let mut sc = Scanner::new(b"\"contains } in quotes\" }after");
        sc.skip_entry().unwrap();
        assert_eq!(&sc.bytes[sc.pos..], b"after");
    }
}
