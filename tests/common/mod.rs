//! Shared test fixtures: a small bibliography and helpers to index it.

#![allow(dead_code)]

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bibix::binary::Sidecar;
use bibix::search::LookupSession;

/// A small but representative bibliography: abbreviations, compound
/// words, TeX markup, math mode, and a numeric field.
pub const SAMPLE_BIB: &str = "\
@string{stoc = \"Proc. ACM Symp. Theory of Computing\"}

@article{erdos50,
  author =  {P. Erd{\\H o}s},
  title =   {On half-spaces and related problems},
  year =    1950,
}

@inproceedings{orourke87,
  author =    {J. O'Rourke},
  title =     {Art gallery theorems in $\\Omega(n\\log n)$ time},
  booktitle = stoc,
  year =      1987,
}

@article{aurenhammer91,
  author = {F. Aurenhammer},
  title =  {Voronoi diagrams --- a survey},
  year =   1991,
}
";

/// Write `SAMPLE_BIB` into `dir` and index it. Returns the stem path.
pub fn index_sample(dir: &Path) -> PathBuf {
    let bib = dir.join("sample.bib");
    let bix = dir.join("sample.bix");
    std::fs::write(&bib, SAMPLE_BIB).unwrap();
    bibix::build::index_file(&bib, &bix, &[]).unwrap();
    dir.join("sample")
}

/// Open a lookup session over an indexed stem.
pub fn open_session(stem: &Path) -> LookupSession<File> {
    let bib = File::open(stem.with_extension("bib")).unwrap();
    let bix = File::open(stem.with_extension("bix")).unwrap();
    let mut reader = BufReader::new(bix);
    let sidecar = Sidecar::load(&mut reader).unwrap();
    LookupSession::new(sidecar, bib, reader.into_inner())
}

/// Run one `find` statement and return the matching entry ids.
pub fn find(session: &mut LookupSession<File>, field: &str, word: &str) -> Vec<usize> {
    session.clear_results();
    assert!(session.set_up_field(field) > 0);
    session.find_word(word, word.ends_with('*')).unwrap();
    session.combine_results(false, true);
    session.result_ids()
}
