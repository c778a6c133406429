//! Edge cases for the posting codec and the pattern matcher, as seen
//! from outside the crate.

use bibix::binary::{compress_refs, uncompress_refs};
use bibix::search::pattern;

#[test]
fn empty_posting_list_is_empty_bytes() {
    let encoded = compress_refs(&[]);
    assert!(encoded.is_empty());
    assert_eq!(uncompress_refs(&encoded, 0).unwrap(), Vec::<u32>::new());
}

#[test]
fn id_zero_still_costs_a_byte() {
    // The delta base is -1, so the first delta is id + 1, never zero.
    let encoded = compress_refs(&[0]);
    assert_eq!(encoded, vec![1]);
}

#[test]
fn wide_deltas_round_trip() {
    let ids = vec![0, 1, 2_000_000_000, 2_000_000_001];
    let encoded = compress_refs(&ids);
    assert_eq!(uncompress_refs(&encoded, ids.len()).unwrap(), ids);
}

#[test]
fn count_mismatch_is_rejected() {
    let encoded = compress_refs(&[1, 2, 3]);
    assert!(uncompress_refs(&encoded, 2).is_err());
    assert!(uncompress_refs(&encoded, 4).is_err());
}

#[test]
fn pattern_matching_is_case_blind() {
    // Stored words are lower case, but the matcher shouldn't care.
    assert!(pattern::matches(b"VORONOI", b"voronoi"));
    assert!(pattern::matches(b"v?RON*", b"voronoi"));
}

#[test]
fn star_only_pattern_matches_any_word() {
    for word in ["a", "voronoi", "18"] {
        assert!(pattern::matches(b"*", word.as_bytes()), "{}", word);
    }
}
