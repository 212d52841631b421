use crate::common::configure_criterion;
use criterion::{criterion_group, Criterion};
use deferred_rail::prelude::*;
use futures::{stream, StreamExt};
use std::time::Duration;
use tokio::runtime::Runtime;

pub fn bench_deferred_settlement(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("async/deferred");

    group.bench_function("resolve_then_wait", |b| {
        b.iter(|| {
            rt.block_on(async {
                let deferred: Deferred<u64, String> = Deferred::new();
                deferred.resolve(1);
                let _ = deferred.wait().await;
            })
        })
    });

    group.bench_function("with_hooks", |b| {
        b.iter(|| {
            rt.block_on(async {
                let options = DeferredOptions::new().on_settle(|| Ok(()));
                let deferred: Deferred<u64, String> = Deferred::with_options(options);
                deferred.resolve(1);
                let _ = deferred.wait().await;
            })
        })
    });

    group.finish();
}

pub fn bench_races(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("async/race");

    group.bench_function("timeout_ready_future", |b| {
        b.iter(|| {
            rt.block_on(async {
                let _ = async { Ok::<_, TimeoutError>(1) }
                    .with_timeout(Duration::from_secs(1), TimeoutErrorSpec::Default)
                    .await;
            })
        })
    });

    group.bench_function("abortable_ready_future", |b| {
        let controller = AbortController::new();
        b.iter(|| {
            rt.block_on(async {
                let _ = async { Ok::<_, AbortError>(1) }
                    .with_signal(Some(&controller.signal()))
                    .await;
            })
        })
    });

    group.finish();
}

pub fn bench_retry(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("async/retry");

    group.bench_function("two_failures_no_delay", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut attempts = 0u32;
                let _ = with_retry(
                    || {
                        attempts += 1;
                        let attempt = attempts;
                        async move { if attempt < 3 { Err("busy") } else { Ok(attempt) } }
                    },
                    RetryOptions::new(5),
                )
                .await;
            })
        })
    });

    group.finish();
}

pub fn bench_streams(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("async/stream");

    group.bench_function("merge_4x250", |b| {
        b.iter(|| {
            rt.block_on(async {
                let sources = (0..4).map(|_| stream::iter(0..250u32)).collect::<Vec<_>>();
                let _ = merge(sources).count().await;
            })
        })
    });

    group.bench_function("chunk_1000_by_16", |b| {
        b.iter(|| {
            rt.block_on(async {
                let chunks = chunk(stream::iter(0..1000u32), 16, ChunkOptions::new()).unwrap();
                let _ = chunks.count().await;
            })
        })
    });

    group.finish();
}

criterion_group! {
    name = async_ops_benches;
    config = configure_criterion();
    targets =
        bench_deferred_settlement,
        bench_races,
        bench_retry,
        bench_streams,
}
