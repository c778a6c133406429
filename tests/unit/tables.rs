//! Dictionary and bitset behavior across the crate boundary.

use bibix::{Dict, EntrySet, Word};

#[test]
fn dictionary_keys_collide_at_the_truncation_point() {
    // 31 bytes of key are significant; the rest is deliberately lost,
    // matching what the sidecar stores.
    let mut dict: Dict<u32> = Dict::new();
    let a = Word::new(format!("{}one", "k".repeat(31)).as_bytes()).0;
    let b = Word::new(format!("{}two", "k".repeat(31)).as_bytes()).0;
    *dict.entry_or_insert_with(&a, || 0) = 1;
    *dict.entry_or_insert_with(&b, || 0) = 2;
    assert_eq!(dict.len(), 1);
    assert_eq!(dict.get(&a), Some(&2));
}

#[test]
fn occupancy_stays_under_fifteen_sixteenths_through_growth() {
    let mut dict: Dict<()> = Dict::new();
    for i in 0..5000 {
        dict.entry_or_insert_with(&Word::new(format!("w{}", i).as_bytes()).0, || ());
        assert!(dict.len() * 16 < dict.capacity() * 15);
    }
}

#[test]
fn entry_set_counts_across_block_boundaries() {
    let mut set = EntrySet::new(129);
    set.insert(63);
    set.insert(64);
    set.insert(128);
    assert_eq!(set.count(), 3);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![63, 64, 128]);
}

#[test]
fn complement_of_empty_is_the_whole_universe() {
    for universe in [1, 63, 64, 65, 127, 128, 129] {
        let mut set = EntrySet::new(universe);
        set.complement();
        assert_eq!(set.count(), universe, "universe {}", universe);
    }
}
