// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! LRU cache of compressed posting lists.
//!
//! The cache is a min-heap over access stamps, stored in a flat array.
//! The heap holds (field, word) coordinates into the sidecar tables and
//! each resident posting list stores its own heap index back, so the two
//! sides find each other without a true cyclic pointer.
//!
//! On a fault the compressed bytes are read from the sidecar at the
//! recorded offset. When the cache is full the heap root - the least
//! recently used list - is evicted and its buffer dropped. Re-accessing a
//! resident list just restamps it and sifts it down; the fresh stamp is
//! the newest in the heap, so sliding it along the smaller-child path to
//! a leaf restores heap order in one pass.
//!
//! Stamps increment monotonically. If the counter ever wraps negative,
//! every stamp is renumbered 0..n in current heap order and the counter
//! reset - a benign reordering of equal-vintage entries.

use std::io::{self, Read, Seek, SeekFrom};

use crate::binary::reader::FieldIndex;

/// Default cache capacity, in posting lists.
pub const CACHE_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy)]
struct HeapSlot {
    stamp: i64,
    field: usize,
    word: usize,
}

/// Min-heap LRU over posting-list slots.
#[derive(Debug)]
pub struct PostingCache {
    heap: Vec<HeapSlot>,
    capacity: usize,
    stamp: i64,
}

impl PostingCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be nonzero");
        PostingCache {
            heap: Vec::with_capacity(capacity),
            capacity,
            stamp: 0,
        }
    }

    /// Number of resident posting lists.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Is this (field, word) slot resident?
    pub fn contains(&self, field: usize, word: usize) -> bool {
        self.heap
            .iter()
            .any(|slot| slot.field == field && slot.word == word)
    }

    /// Make the posting list at `(field, word)` resident and mark it as
    /// the most recently used. `source` is the open sidecar file.
    pub fn access<R: Read + Seek>(
        &mut self,
        fields: &mut [FieldIndex],
        field: usize,
        word: usize,
        source: &mut R,
    ) -> io::Result<()> {
        let next_stamp = self.stamp;
        self.stamp = self.stamp.wrapping_add(1);

        if fields[field].words[word].refs.data.is_none() {
            // Fault in from disk.
            let (offset, bytes) = {
                let refs = &fields[field].words[word].refs;
                (refs.offset, refs.bytes as usize)
            };
            source.seek(SeekFrom::Start(offset))?;
            let mut data = vec![0u8; bytes];
            source.read_exact(&mut data)?;

            if self.heap.len() == self.capacity {
                // Evict the oldest: drop its buffer, move the tail into
                // the root, and sift it down.
                let oldest = self.heap[0];
                fields[oldest.field].words[oldest.word].refs.data = None;

                let tail = self.heap.pop().unwrap_or(oldest);
                if !self.heap.is_empty() {
                    self.heap[0] = tail;
                    self.sift_down(fields, 0);
                }
            }

            fields[field].words[word].refs.data = Some(data);
            fields[field].words[word].refs.rank = self.heap.len();
            self.heap.push(HeapSlot {
                stamp: next_stamp,
                field,
                word,
            });
        } else {
            let rank = fields[field].words[word].refs.rank;
            self.heap[rank].stamp = next_stamp;
            self.sift_down(fields, rank);
        }

        self.check_stamp();
        Ok(())
    }

    /// Slide the element at `which` down to a leaf along the
    /// smaller-child path, updating back-references as entries move up.
    fn sift_down(&mut self, fields: &mut [FieldIndex], which: usize) {
        let n = self.heap.len();
        let moved = self.heap[which];
        let mut i = which;

        while 2 * i + 1 < n {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let child = if right == n || self.heap[left].stamp < self.heap[right].stamp {
                left
            } else {
                right
            };
            self.heap[i] = self.heap[child];
            let up = self.heap[i];
            fields[up.field].words[up.word].refs.rank = i;
            i = child;
        }

        self.heap[i] = moved;
        fields[moved.field].words[moved.word].refs.rank = i;
    }

    /// Recover from stamp wraparound by renumbering in heap order.
    fn check_stamp(&mut self) {
        if self.stamp < 0 {
            for (i, slot) in self.heap.iter_mut().enumerate() {
                slot.stamp = i as i64;
            }
            self.stamp = self.heap.len() as i64;
            eprintln!("You've been running biblook a long time, haven't you?");
        }
    }

    #[cfg(test)]
    fn preset_stamp(&mut self, stamp: i64) {
        self.stamp = stamp;
    }
}

impl Default for PostingCache {
    fn default() -> Self {
        Self::new()
    }
}
