//! Criterion benchmarks for placer-core critical operations.
//!
//! Covers: the SHA-256 hot path (single and double hash), canonical block
//! encoding, and the threshold predicate: the three operations executed
//! once per nonce attempt.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use placer_core::digest::{double_sha256, double_sha256_hex, sha256};
use placer_core::threshold::meets_threshold;
use placer_core::types::PendingBlock;

fn sample_pending() -> PendingBlock {
    PendingBlock {
        id: 17,
        prev_digest: "00a1b2c3d4e5f60718293a4b5c6d7e8f00a1b2c3d4e5f60718293a4b5c6d7e8f"
            .to_string(),
        payload: "This is the initial data in the 1st block".to_string(),
        difficulty: 2,
    }
}

fn bench_sha256(c: &mut Criterion) {
    let encoded = sample_pending().encode_with_nonce(123_456);
    c.bench_function("sha256_canonical_block", |b| {
        b.iter(|| sha256(black_box(encoded.as_bytes())))
    });
}

fn bench_double_sha256(c: &mut Criterion) {
    let encoded = sample_pending().encode_with_nonce(123_456);
    c.bench_function("double_sha256_canonical_block", |b| {
        b.iter(|| double_sha256(black_box(encoded.as_bytes())))
    });
}

fn bench_nonce_attempt(c: &mut Criterion) {
    // One full search step: encode, double-hash, render, threshold-check.
    let pending = sample_pending();
    c.bench_function("full_nonce_attempt", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            let encoded = pending.encode_with_nonce(black_box(nonce));
            let digest = double_sha256_hex(encoded.as_bytes());
            meets_threshold(&digest, pending.difficulty)
        })
    });
}

fn bench_threshold(c: &mut Criterion) {
    let digest = double_sha256_hex(b"threshold input");
    c.bench_function("meets_threshold", |b| {
        b.iter(|| meets_threshold(black_box(&digest), black_box(3)))
    });
}

criterion_group!(
    benches,
    bench_sha256,
    bench_double_sha256,
    bench_nonce_attempt,
    bench_threshold,
);
criterion_main!(benches);
