use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ranqx::core::config::{Config, RetrievalAlgorithm};
use ranqx::index::memory::{IndexDocument, MemoryIndex};
use ranqx::search::engine::QueryEngine;

const WORDS: [&str; 12] = [
    "river", "mountain", "forest", "ocean", "desert", "valley",
    "glacier", "canyon", "prairie", "island", "volcano", "lagoon",
];

/// Helper to build a collection of random documents
fn build_index(num_docs: usize, doc_len: usize) -> MemoryIndex {
    let mut rng = StdRng::seed_from_u64(42);
    let mut index = MemoryIndex::new();
    for id in 0..num_docs {
        let body = (0..doc_len)
            .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
            .collect::<Vec<_>>()
            .join(" ");
        index.add_document(IndexDocument::new(format!("doc-{}", id)).field("body", body)).unwrap();
    }
    index
}

fn config(algorithm: RetrievalAlgorithm) -> Config {
    Config {
        retrieval_algorithm: algorithm,
        ..Config::default()
    }
}

fn bench_operators(c: &mut Criterion) {
    let queries = [
        ("and", RetrievalAlgorithm::RankedBoolean, "#AND(river mountain glacier)"),
        ("or", RetrievalAlgorithm::RankedBoolean, "#OR(river mountain glacier)"),
        ("near", RetrievalAlgorithm::RankedBoolean, "#NEAR/2(river mountain)"),
        ("window", RetrievalAlgorithm::RankedBoolean, "#WINDOW/8(river mountain glacier)"),
        ("bm25_sum", RetrievalAlgorithm::Bm25, "river mountain glacier"),
        ("indri_and", RetrievalAlgorithm::Indri, "river mountain glacier"),
    ];

    let mut group = c.benchmark_group("evaluate");
    for num_docs in [1_000, 10_000] {
        let index = build_index(num_docs, 50);
        for (name, algorithm, query) in queries {
            let engine = QueryEngine::new(&index, &config(algorithm)).unwrap();
            let node = engine.parse(query).unwrap().unwrap();
            group.bench_with_input(BenchmarkId::new(name, num_docs), &node, |b, node| {
                b.iter(|| black_box(engine.evaluate(node).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_top_n(c: &mut Criterion) {
    let index = build_index(10_000, 50);
    let engine = QueryEngine::new(&index, &config(RetrievalAlgorithm::Bm25)).unwrap();

    let mut group = c.benchmark_group("search_top_n");
    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(engine.search("river valley lagoon", n).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_operators, bench_top_n);
criterion_main!(benches);
