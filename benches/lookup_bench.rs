//! Benchmarks for the lookup hot path: indexing a synthetic
//! bibliography, literal and pattern searches, and posting decode.

use std::io::Cursor;
use std::time::UNIX_EPOCH;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bibix::binary::{compress_refs, uncompress_refs, Sidecar};
use bibix::search::LookupSession;
use bibix::Indexer;

/// A synthetic bibliography with a spread of authors and title words.
fn synthetic_bib(entries: usize) -> String {
    let authors = ["erdos", "orourke", "aurenhammer", "chazelle", "seidel"];
    let topics = [
        "voronoi", "delaunay", "triangulation", "convex", "halfspace",
        "arrangement", "visibility", "matching", "spanner", "embedding",
    ];
    let mut out = String::new();
    for i in 0..entries {
        out.push_str(&format!(
            "@article{{e{i},\n  author = {{{}}},\n  title = {{On {} {} problems}},\n  year = {}\n}}\n\n",
            authors[i % authors.len()],
            topics[i % topics.len()],
            topics[(i * 3 + 1) % topics.len()],
            1950 + (i % 70),
        ));
    }
    out
}

fn build_session(source: &str) -> LookupSession<Cursor<Vec<u8>>> {
    let mut bix = Vec::new();
    Indexer::new()
        .run(source.as_bytes(), UNIX_EPOCH, &mut bix, None)
        .unwrap();
    let sidecar = Sidecar::load(&mut Cursor::new(&bix)).unwrap();
    LookupSession::new(
        sidecar,
        Cursor::new(source.as_bytes().to_vec()),
        Cursor::new(bix),
    )
}

fn bench_indexing(c: &mut Criterion) {
    let source = synthetic_bib(1000);
    c.bench_function("index_1000_entries", |b| {
        b.iter(|| {
            let mut bix = Vec::new();
            Indexer::new()
                .run(black_box(source.as_bytes()), UNIX_EPOCH, &mut bix, None)
                .unwrap();
            black_box(bix)
        })
    });
}

fn bench_literal_search(c: &mut Criterion) {
    let source = synthetic_bib(1000);
    let mut session = build_session(&source);
    c.bench_function("find_literal", |b| {
        b.iter(|| {
            session.clear_results();
            session.set_up_field("au");
            session.find_word(black_box("erdos"), false).unwrap();
            session.combine_results(false, true);
            black_box(session.result_count())
        })
    });
}

fn bench_pattern_search(c: &mut Criterion) {
    let source = synthetic_bib(1000);
    let mut session = build_session(&source);
    c.bench_function("find_pattern", |b| {
        b.iter(|| {
            session.clear_results();
            session.set_up_field("t");
            session.find_word(black_box("*ation*"), false).unwrap();
            session.combine_results(false, true);
            black_box(session.result_count())
        })
    });
}

fn bench_varint_codec(c: &mut Criterion) {
    let ids: Vec<u32> = (0..10_000u32).map(|i| i * 7).collect();
    let encoded = compress_refs(&ids);
    c.bench_function("uncompress_10k_refs", |b| {
        b.iter(|| uncompress_refs(black_box(&encoded), ids.len()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_indexing,
    bench_literal_search,
    bench_pattern_search,
    bench_varint_codec
);
criterion_main!(benches);
