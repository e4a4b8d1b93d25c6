//! Criterion benchmarks for the remote-input message codec.
//!
//! Every keystroke on the remote page becomes one `input` frame, so decode
//! latency sits on the typing path.
//!
//! Run with:
//! ```bash
//! cargo bench --package remote-input-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use remote_input_core::{decode_operation, encode_result, HandlerResult};

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_operation");
    for len in [0usize, 32, 1024] {
        let payload = format!(
            r#"{{"operation":"input","content":"{}"}}"#,
            "a".repeat(len)
        );
        group.bench_with_input(BenchmarkId::new("input", len), &payload, |b, p| {
            b.iter(|| decode_operation(black_box(p)))
        });
    }
    group.bench_function("submit", |b| {
        b.iter(|| decode_operation(black_box(r#"{"operation":"SUBMIT"}"#)))
    });
    group.bench_function("unknown", |b| {
        b.iter(|| decode_operation(black_box(r#"{"operation":"paste"}"#)))
    });
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let results = [
        ("success", HandlerResult::Success),
        ("error", HandlerResult::error("no input dialog is currently listening")),
        ("close", HandlerResult::close("bye")),
    ];
    let mut group = c.benchmark_group("encode_result");
    for (name, result) in &results {
        group.bench_function(*name, |b| b.iter(|| encode_result(black_box(result))));
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
