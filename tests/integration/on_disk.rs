//! Indexing and lookup through the filesystem.

use crate::common::{find, index_sample, open_session, SAMPLE_BIB};

#[test]
fn index_and_query_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let stem = index_sample(dir.path());
    let mut session = open_session(&stem);

    // Entry ids: 0 = @string, 1 = erdos50, 2 = orourke87,
    // 3 = aurenhammer91.
    assert_eq!(session.num_entries(), 4);

    assert_eq!(find(&mut session, "au", "erdos"), vec![1]);
    assert_eq!(find(&mut session, "au", "orourke"), vec![2]);
    assert_eq!(find(&mut session, "t", "voronoi"), vec![3]);

    // Compound word: components and concatenation.
    assert_eq!(find(&mut session, "t", "half"), vec![1]);
    assert_eq!(find(&mut session, "t", "halfspaces"), vec![1]);

    // Math mode split.
    assert_eq!(find(&mut session, "t", "omega"), vec![2]);

    // Abbreviation propagation through the booktitle macro.
    assert_eq!(find(&mut session, "b", "theory"), vec![2]);
    assert_eq!(find(&mut session, "b", "stoc"), vec![2]);

    // Numbers are words.
    assert_eq!(find(&mut session, "y", "1987"), vec![2]);

    // All-fields search via the empty prefix.
    assert_eq!(find(&mut session, "", "1950"), vec![1]);
}

#[test]
fn reindexing_the_same_file_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let bib = dir.path().join("sample.bib");
    let bix = dir.path().join("sample.bix");
    std::fs::write(&bib, SAMPLE_BIB).unwrap();

    bibix::build::index_file(&bib, &bix, &[]).unwrap();
    let first = std::fs::read(&bix).unwrap();
    bibix::build::index_file(&bib, &bix, &[]).unwrap();
    let second = std::fs::read(&bix).unwrap();

    assert_eq!(first, second);
}

#[test]
fn ignored_fields_are_absent_from_the_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let bib = dir.path().join("sample.bib");
    let bix = dir.path().join("sample.bix");
    std::fs::write(&bib, SAMPLE_BIB).unwrap();
    bibix::build::index_file(&bib, &bix, &["year".to_string()]).unwrap();

    let mut reader = std::io::BufReader::new(std::fs::File::open(&bix).unwrap());
    let sidecar = bibix::binary::Sidecar::load(&mut reader).unwrap();
    assert!(sidecar.fields.iter().all(|f| f.name.as_str() != "year"));
}

#[test]
fn display_returns_the_original_record_text() {
    let dir = tempfile::tempdir().unwrap();
    let stem = index_sample(dir.path());
    let mut session = open_session(&stem);

    find(&mut session, "t", "voronoi");
    let mut out = Vec::new();
    session.print_results(&mut out, false).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("@article{aurenhammer91,"));
    assert!(text.contains("{Voronoi diagrams --- a survey}"));
    assert!(!text.contains("erdos50"));
}

#[test]
fn whatis_displays_the_defining_entry() {
    let dir = tempfile::tempdir().unwrap();
    let stem = index_sample(dir.path());
    let mut session = open_session(&stem);

    let mut out = Vec::new();
    session.display_abbrev("stoc", &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("@string{stoc"));

    // Builtins and unknowns print a notice and write nothing.
    let mut out = Vec::new();
    session.display_abbrev("jan", &mut out).unwrap();
    assert!(out.is_empty());
    let mut out = Vec::new();
    session.display_abbrev("nosuch", &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn corrupt_sidecar_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let stem = index_sample(dir.path());
    let bix = stem.with_extension("bix");

    let mut bytes = std::fs::read(&bix).unwrap();
    bytes[9] = b'9'; // clobber the file version digit
    std::fs::write(&bix, &bytes).unwrap();

    let mut reader = std::io::BufReader::new(std::fs::File::open(&bix).unwrap());
    assert!(bibix::binary::Sidecar::load(&mut reader).is_err());
}
