//! ED2K throughput, in memory and through the streaming hasher

use anisort_core::hashing::{BLOCK_SIZE, ContentHasher, Ed2kHasher};
use anisort_core::{SharedProvider, Shutdown};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::Path;
use tokio::runtime::Runtime;

fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn format_size(size: usize) -> String {
    if size >= 1_048_576 {
        format!("{}MB", size / 1_048_576)
    } else {
        format!("{}KB", size / 1024)
    }
}

fn benchmark_ed2k(c: &mut Criterion) {
    let mut group = c.benchmark_group("ed2k");
    group.sample_size(10);

    for size in [1_048_576, BLOCK_SIZE, BLOCK_SIZE * 3 + 1024] {
        let data = generate_test_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::new("hash_bytes", format_size(size)),
            &data,
            |b, data| b.iter(|| black_box(Ed2kHasher::hash_bytes(black_box(data)))),
        );
    }

    group.finish();
}

fn benchmark_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    group.sample_size(10);
    let runtime = Runtime::new().unwrap();
    let data = generate_test_data(BLOCK_SIZE * 2);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for buffer in [64 * 1024, 1024 * 1024] {
        let hasher = ContentHasher::new(SharedProvider::null(), Shutdown::new())
            .with_read_buffer_size(buffer);
        group.bench_with_input(
            BenchmarkId::new("read_buffer", format_size(buffer)),
            &data,
            |b, data| {
                b.iter(|| {
                    runtime.block_on(async {
                        let mut reader = data.as_slice();
                        let output = hasher
                            .hash_reader(&mut reader, Path::new("bench"), data.len() as u64)
                            .await
                            .unwrap();
                        black_box(output.hash)
                    })
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_ed2k, benchmark_streaming);
criterion_main!(benches);
