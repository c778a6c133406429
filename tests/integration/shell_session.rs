//! Driving the command shell end to end with scripted input.

use std::io::Cursor;

use crate::common::{index_sample, open_session};

fn run_script(script: &str, save_path: &std::path::Path) {
    let dir = tempfile::tempdir().unwrap();
    let stem = index_sample(dir.path());
    let mut session = open_session(&stem);
    bibix::shell::run(
        &mut session,
        Cursor::new(script.as_bytes().to_vec()),
        save_path.to_str().unwrap(),
        false,
    )
    .unwrap();
}

#[test]
fn find_and_save_appends_matches() {
    let out_dir = tempfile::tempdir().unwrap();
    let save = out_dir.path().join("picks.bib");

    run_script("find au erdos\nsave\nquit\n", &save);

    let text = std::fs::read_to_string(&save).unwrap();
    assert!(text.starts_with("% Retrieved by biblook"));
    assert!(text.contains("@article{erdos50,"));
    assert!(!text.contains("aurenhammer91"));
}

#[test]
fn boolean_query_line_with_symbols() {
    let out_dir = tempfile::tempdir().unwrap();
    let save = out_dir.path().join("picks.bib");

    // Authors erdos or orourke, minus Voronoi titles; one statement.
    run_script(
        "f au erdos | au orourke & ~t voronoi ; s\nquit\n",
        &save,
    );

    let text = std::fs::read_to_string(&save).unwrap();
    assert!(text.contains("@article{erdos50,"));
    assert!(text.contains("@inproceedings{orourke87,"));
    assert!(!text.contains("aurenhammer91"));
}

#[test]
fn save_twice_appends() {
    let out_dir = tempfile::tempdir().unwrap();
    let save = out_dir.path().join("picks.bib");

    run_script("f y 1987\ns\ns\nquit\n", &save);

    let text = std::fs::read_to_string(&save).unwrap();
    assert_eq!(text.matches("@inproceedings{orourke87,").count(), 2);
}

#[test]
fn syntax_errors_recover_at_the_next_line() {
    let out_dir = tempfile::tempdir().unwrap();
    let save = out_dir.path().join("picks.bib");

    // The first line is garbage; the second works.
    run_script("grumble frotz\nf au orourke\ns\nquit\n", &save);

    let text = std::fs::read_to_string(&save).unwrap();
    assert!(text.contains("@inproceedings{orourke87,"));
}

#[test]
fn explicit_save_file_overrides_default() {
    let out_dir = tempfile::tempdir().unwrap();
    let default = out_dir.path().join("default.bib");
    let explicit = out_dir.path().join("explicit.bib");

    run_script(
        &format!("f t voronoi\nsave {}\nquit\n", explicit.display()),
        &default,
    );

    assert!(!default.exists());
    let text = std::fs::read_to_string(&explicit).unwrap();
    assert!(text.contains("@article{aurenhammer91,"));
}
