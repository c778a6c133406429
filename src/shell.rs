// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The interactive command shell: a line tokenizer and one big finite
//! state machine. It's long and boring, but that's interface code for ya.
//!
//! Commands may be abbreviated to any prefix (`f` is `find`, `d` is
//! `display`), except the combinators `and`, `or`, and `not`, which must
//! be spelled out so they can't swallow search terms. `&`, `|`, `~`/`!`,
//! and `;` are their one-character forms; `?` asks for help, which is
//! short the first time and long when repeated; `@` prints the version
//! banner. Several statements can share a line, separated by semicolons.
//!
//! Anything unexpected drops the machine into an error state that
//! swallows the rest of the line and resumes cleanly at the prompt. A
//! pattern cannot begin with `?` - the tokenizer takes it for a help
//! request first. Documented limitation; nobody has complained since
//! 1998.

use std::fs::OpenOptions;
use std::io::{self, BufRead, Read, Seek, Write};

use crate::binary::header::{FILE_VERSION, MAJOR_VERSION, MINOR_VERSION};
use crate::search::LookupSession;

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Find,
    Display,
    Save,
    Whatis,
    Quit,
    Help,
    And,
    Or,
    Not,
    Semi,
    Return,
    Banner,
    Word,
}

/// Command words matched by prefix, in lookup order.
const PREFIX_COMMANDS: &[(&str, Token)] = &[
    ("find", Token::Find),
    ("display", Token::Display),
    ("help", Token::Help),
    ("save", Token::Save),
    ("whatis", Token::Whatis),
    ("quit", Token::Quit),
];

/// Command words that must match exactly.
const EXACT_COMMANDS: &[(&str, Token)] = &[
    ("and", Token::And),
    ("or", Token::Or),
    ("not", Token::Not),
];

/// Line-oriented tokenizer over an input stream.
struct Tokenizer<R: BufRead> {
    input: R,
    line: Vec<u8>,
    pos: usize,
    need_line: bool,
    interactive: bool,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(input: R, interactive: bool) -> Self {
        Tokenizer {
            input,
            line: Vec::new(),
            pos: 0,
            need_line: true,
            interactive,
        }
    }

    /// Next token; word text (original case) lands in `text`.
    fn next(&mut self, text: &mut String) -> io::Result<Token> {
        text.clear();

        if self.need_line {
            if self.interactive {
                print!("biblook: ");
                io::stdout().flush()?;
            }
            self.line.clear();
            let mut raw = String::new();
            if self.input.read_line(&mut raw)? == 0 {
                return Ok(Token::Quit); // EOF
            }
            self.line = raw.into_bytes();
            if self.line.last() != Some(&b'\n') {
                self.line.push(b'\n');
            }
            self.pos = 0;
            self.need_line = false;
        }

        while self.pos < self.line.len()
            && (self.line[self.pos] == b' ' || self.line[self.pos] == b'\t')
        {
            self.pos += 1;
        }

        let ch = self.line.get(self.pos).copied().unwrap_or(b'\n');
        match ch {
            b'\n' | b'\r' => {
                self.need_line = true;
                Ok(Token::Return)
            }
            b'&' => {
                self.pos += 1;
                Ok(Token::And)
            }
            b'|' => {
                self.pos += 1;
                Ok(Token::Or)
            }
            b'~' | b'!' => {
                self.pos += 1;
                Ok(Token::Not)
            }
            b';' => {
                self.pos += 1;
                Ok(Token::Semi)
            }
            b'?' => {
                self.pos += 1;
                Ok(Token::Help)
            }
            b'@' => {
                self.pos += 1;
                Ok(Token::Banner)
            }
            _ => {
                // Keep the raw case: save filenames pass through intact.
                // Command words compare case-blind; search terms are
                // lowered later by strip/strip_ext.
                while self.pos < self.line.len() {
                    let c = self.line[self.pos];
                    if c.is_ascii_whitespace() || c == b';' || c == b'&' || c == b'|' {
                        break;
                    }
                    text.push(c as char);
                    self.pos += 1;
                }

                let lower = text.to_ascii_lowercase();
                for (name, token) in PREFIX_COMMANDS {
                    if name.starts_with(lower.as_str()) {
                        return Ok(*token);
                    }
                }
                for (name, token) in EXACT_COMMANDS {
                    if *name == lower.as_str() {
                        return Ok(*token);
                    }
                }
                Ok(Token::Word)
            }
        }
    }
}

// ============================================================================
// TOKEN STRIPPING
// ============================================================================

/// Strip all but alphanumerics and fold to lower case. Returns the
/// stripped text and whether the original ended with the prefix
/// character `*`.
fn strip(token: &str) -> (String, bool) {
    let mut prefix = false;
    let mut out = String::new();
    for c in token.chars() {
        prefix = c == '*';
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        }
    }
    (out, prefix)
}

/// Like [`strip`], but keeps the wildcards `*` and `?`.
fn strip_ext(token: &str) -> (String, bool) {
    let mut prefix = false;
    let mut out = String::new();
    for c in token.chars() {
        prefix = c == '*';
        if c.is_ascii_alphanumeric() || c == '*' || c == '?' {
            out.push(c.to_ascii_lowercase());
        }
    }
    (out, prefix)
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmdState {
    Wait,
    Find,
    FindNot,
    FindField,
    FindWord,
    Display,
    Save,
    SaveFile,
    Whatis,
    WhatisName,
    Help,
    Error,
}

fn syntax_error() {
    println!("\t?? Syntax error ??");
}

/// Print the version banner.
pub fn banner() {
    println!(
        "biblook version {}.{}  file version {}",
        MAJOR_VERSION, MINOR_VERSION, FILE_VERSION
    );
}

const SHORT_HELP: &[&str] = &[
    "------------------------------------------------------------",
    "help                    Print this message",
    "find <field> <words>    Find entries with <words> in <field>",
    "and  <field> <words>    Narrow search",
    "or   <field> <words>    Widen search",
    "display                 Display search results",
    "save <file>             Save search results to <file>",
    "whatis <abbrev>         Find and display an abbreviation",
    "quit                    Quit biblook",
    "------------------------------------------------------------",
    "Type `help' or `?' again for more details.",
];

const LONG_HELP: &[&str] = &[
    "biblook permits rapid lookup in a BibTeX bibliography data",
    "base, using a compact binary index file prepared by bibindex(1).",
    "",
    "Available commands:",
    "? or h[elp]",
    "     Display this help message.",
    "",
    "f[ind] [not] <field> <words>",
    "     Find the entries containing the given words in any",
    "     field with a prefix matching the <field> argument.  For",
    "     example, `a' matches both `author' and `address', and",
    "     `au' matches `author' only.  If the <field> argument is",
    "     `-' (or any string with no letters or numbers), match",
    "     any field.",
    "",
    "     If `not' appears before the <field>, the sense of the",
    "     search is reversed.  The symbols `~' and `!' can be",
    "     used in place of `not'.",
    "",
    "     Each word is a contiguous sequence of letters and",
    "     digits.  Case is ignored; accents should be omitted;",
    "     apostrophes are not required.  Single characters and a",
    "     few common words are also ignored.  ? matches any single",
    "     character and * matches any string of characters.  Thus,",
    "     `*oint*' matches `point', `points', `pointer', `endpoint',",
    "     `disjoint', etc.  However at present patterns beginning with ?",
    "     cannot be used, as the parser mistakes them for a help request.",
    "",
    "and [not] <field> <words>",
    "or [not] <field> <words>",
    "     Intersect (resp. union) the results of the given search",
    "     with the previous search.  Several of these commands",
    "     may be combined on a single line.  Commands are handled",
    "     in the order in which they appear; there is no pre-",
    "     cedence.  Unlike other commands, and like `not', these",
    "     must be spelled out completely.  `&' can be used in",
    "     place of `and', and `|' can be used in place of `or'.",
    "",
    "d[isplay]",
    "     Display the results of the previous search.",
    "",
    "s[ave] [<filename>]",
    "     Save the results of the previous search into the",
    "     specified file.  If <filename> is omitted, the previous",
    "     save file is used.  If no save file has ever been",
    "     specified, results are saved in the file specified on",
    "     the command line (default `save.bib').  If the save file",
    "     exists, results are appended to it.",
    "",
    "w[hatis] <abbrev>",
    "     Display the definition of the abbreviation <abbrev>.",
    "",
    "q[uit]/EOF",
    "     Quit.",
    "",
    "Several commands can be combined on a single line by",
    "separating them with semicolons.  For example, the following",
    "command displays all STOC papers cowritten by Erdo\"s",
    "without `Voronoi diagrams' in the title:",
    "",
    "f b stoc* | b symp* theory comp* & au erdos & ~t voronoi diagrams ; d",
];

fn give_help(verbose: bool) {
    let lines = if verbose { LONG_HELP } else { SHORT_HELP };
    for line in lines {
        println!("\t{}", line);
    }
}

/// Execute commands until the user quits. `default_save` is the initial
/// save-file name; `interactive` controls the prompt.
pub fn run<S, R>(
    session: &mut LookupSession<S>,
    input: R,
    default_save: &str,
    interactive: bool,
) -> io::Result<()>
where
    S: Read + Seek,
    R: BufRead,
{
    let mut tokens = Tokenizer::new(input, interactive);
    let mut text = String::new();

    let mut state = CmdState::Wait;
    let mut last_state = CmdState::Wait;
    let mut intersect = true;
    let mut invert = false;
    let mut save_file = default_save.to_string();
    let mut whatis_name = String::new();

    session.clear_results();

    loop {
        let token = tokens.next(&mut text)?;

        if token == Token::Quit && text.is_empty() {
            return Ok(()); // EOF
        }

        match state {
            CmdState::Wait => match token {
                Token::Quit => return Ok(()),
                Token::Find => {
                    state = CmdState::Find;
                    invert = false;
                    session.clear_results();
                }
                Token::And => {
                    state = CmdState::Find;
                    invert = false;
                    session.save_results();
                }
                Token::Or => {
                    state = CmdState::Find;
                    invert = false;
                    intersect = false;
                    session.save_results();
                }
                Token::Display => state = CmdState::Display,
                Token::Save => state = CmdState::Save,
                Token::Whatis => state = CmdState::Whatis,
                Token::Help => state = CmdState::Help,
                Token::Banner => {
                    banner();
                    last_state = CmdState::Wait;
                }
                Token::Return | Token::Semi => {}
                _ => {
                    state = CmdState::Error;
                    syntax_error();
                }
            },

            CmdState::Find => {
                if token == Token::Not {
                    last_state = state;
                    state = CmdState::FindNot;
                    invert = true;
                } else if !text.is_empty() {
                    let (field, _) = strip(&text);
                    if session.set_up_field(&field) == 0 {
                        state = CmdState::Error;
                    } else {
                        last_state = CmdState::Find;
                        state = CmdState::FindField;
                    }
                } else {
                    state = if token == Token::Return {
                        CmdState::Wait
                    } else {
                        CmdState::Error
                    };
                    syntax_error();
                }
            }

            CmdState::FindNot => {
                if !text.is_empty() {
                    let (field, _) = strip(&text);
                    if session.set_up_field(&field) == 0 {
                        state = CmdState::Error;
                    } else {
                        last_state = CmdState::FindNot;
                        state = CmdState::FindField;
                    }
                } else {
                    state = if token == Token::Return {
                        CmdState::Wait
                    } else {
                        CmdState::Error
                    };
                    syntax_error();
                }
            }

            CmdState::FindField => {
                if !text.is_empty() {
                    last_state = state;
                    state = CmdState::FindWord;
                    let (word, prefix) = strip_ext(&text);
                    session.find_word(&word, prefix)?;
                } else {
                    state = if token == Token::Return {
                        CmdState::Wait
                    } else {
                        CmdState::Error
                    };
                    syntax_error();
                }
            }

            CmdState::FindWord => match token {
                Token::And => {
                    last_state = state;
                    state = CmdState::Find;
                    session.combine_results(invert, intersect);
                    session.save_results();
                    invert = false;
                    intersect = true;
                }
                Token::Or => {
                    last_state = state;
                    state = CmdState::Find;
                    session.combine_results(invert, intersect);
                    session.save_results();
                    invert = false;
                    intersect = false;
                }
                Token::Semi => {
                    last_state = state;
                    state = CmdState::Wait;
                    session.combine_results(invert, intersect);
                    invert = false;
                    intersect = true;
                }
                Token::Return => {
                    last_state = state;
                    state = CmdState::Wait;
                    session.combine_results(invert, intersect);
                    session.report_results();
                    invert = false;
                    intersect = true;
                }
                _ => {
                    if !text.is_empty() {
                        last_state = state;
                        state = CmdState::FindWord;
                        let (word, prefix) = strip_ext(&text);
                        session.find_word(&word, prefix)?;
                    } else {
                        state = CmdState::Error;
                        syntax_error();
                    }
                }
            },

            CmdState::Display => {
                if token == Token::Semi || token == Token::Return {
                    last_state = state;
                    state = CmdState::Wait;
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    session.print_results(&mut out, false)?;
                } else {
                    state = CmdState::Error;
                    syntax_error();
                }
            }

            CmdState::Save => {
                if !text.is_empty() {
                    last_state = state;
                    state = CmdState::SaveFile;
                    save_file = text.clone();
                } else if token == Token::Semi || token == Token::Return {
                    state = CmdState::Wait;
                    save_results(session, &save_file)?;
                } else {
                    state = CmdState::Error;
                    syntax_error();
                }
            }

            CmdState::SaveFile => {
                if token == Token::Semi || token == Token::Return {
                    last_state = state;
                    state = CmdState::Wait;
                    save_results(session, &save_file)?;
                } else {
                    state = CmdState::Error;
                    syntax_error();
                }
            }

            CmdState::Whatis => {
                if !text.is_empty() {
                    last_state = state;
                    state = CmdState::WhatisName;
                    whatis_name = text.to_ascii_lowercase();
                } else {
                    state = if token == Token::Return {
                        CmdState::Wait
                    } else {
                        CmdState::Error
                    };
                    syntax_error();
                }
            }

            CmdState::WhatisName => {
                if token == Token::Semi || token == Token::Return {
                    last_state = state;
                    state = CmdState::Wait;
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    session.display_abbrev(&whatis_name, &mut out)?;
                } else {
                    state = CmdState::Error;
                    syntax_error();
                }
            }

            CmdState::Help => {
                if token == Token::Semi || token == Token::Return {
                    state = CmdState::Wait;
                    give_help(last_state == CmdState::Help);
                    last_state = CmdState::Help;
                }
            }

            CmdState::Error => match token {
                Token::Quit => return Ok(()),
                Token::Return => state = CmdState::Wait,
                _ => {}
            },
        }
    }
}

fn save_results<S: Read + Seek>(
    session: &mut LookupSession<S>,
    path: &str,
) -> io::Result<()> {
    if session.result_count() == 0 {
        println!("\tNothing to display!");
        return Ok(());
    }
    let file = OpenOptions::new().create(true).append(true).open(path);
    match file {
        Err(e) => {
            println!("\tCan't open {}: {}", path, e);
            Ok(())
        }
        Ok(file) => {
            let mut out = io::BufWriter::new(file);
            session.print_results(&mut out, true)?;
            println!("\tResults saved in \"{}\"", path);
            Ok(())
        }
    }
}
