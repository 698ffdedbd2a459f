//! Lifecycle and ingestion benchmarks
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! Measures the two-phase path (read + conditional write) against the
//! in-memory store, so regressions in the store's locking show up here.
//!
//! Run with: cargo bench --bench lifecycle_benchmarks

use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use serde_json::json;
use sinklab::clock::SystemClock;
use sinklab::experiment::{ParticipantRecord, ResponseBatch};
use sinklab::ingest::ResponseSink;
use sinklab::lifecycle::LifecycleManager;
use sinklab::origin::AllowedOrigin;
use sinklab::store::{DocumentStore, MemoryDocumentStore};

const BATCH_SIZES: [usize; 3] = [1, 16, 256];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Benchmark a full stop → reopen cycle on an Active participant
fn bench_transition_cycle(c: &mut Criterion) {
    let rt = runtime();
    let store = Arc::new(MemoryDocumentStore::new());
    rt.block_on(async {
        store
            .insert_participant(
                ParticipantRecord::builder("p-1", "exp-1")
                    .started(Utc::now())
                    .build(),
            )
            .await
            .unwrap();
    });
    let lifecycle = LifecycleManager::new(Arc::clone(&store), Arc::new(SystemClock::new()));

    c.bench_function("lifecycle_stop_reopen", |b| {
        b.to_async(&rt).iter(|| async {
            lifecycle.stop(black_box("p-1")).await.unwrap();
            lifecycle.reopen(black_box("p-1")).await.unwrap();
        });
    });
}

/// Fresh Active participant in its own store, so every append starts empty.
fn active_sink(rt: &tokio::runtime::Runtime) -> ResponseSink<MemoryDocumentStore> {
    let store = Arc::new(MemoryDocumentStore::new());
    rt.block_on(async {
        store
            .insert_participant(
                ParticipantRecord::builder("p-1", "exp-1")
                    .started(Utc::now())
                    .build(),
            )
            .await
            .unwrap();
    });
    ResponseSink::new(store)
}

/// Benchmark response appends of increasing batch size
fn bench_sink_append(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("sink_append");

    for size in BATCH_SIZES {
        let batch: ResponseBatch = (0..size)
            .map(|i| (format!("trial-{i}"), json!({"rt": i, "correct": i % 2 == 0})))
            .collect();

        group.bench_with_input(BenchmarkId::new("batch", size), &batch, |b, batch| {
            b.iter_batched(
                || (active_sink(&rt), batch.clone()),
                |(sink, batch)| rt.block_on(sink.submit("p-1", batch)).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark origin derivation from declared urls
fn bench_origin_derivation(c: &mut Criterion) {
    let url = "https://Lab.Example.org:8443/studies/stroop/index.html?session=42#top";
    c.bench_function("origin_from_declared_url", |b| {
        b.iter(|| AllowedOrigin::from_declared_url(black_box(Some(url))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_transition_cycle,
    bench_sink_append,
    bench_origin_derivation
);
criterion_main!(benches);
