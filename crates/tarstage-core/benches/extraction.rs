//! Benchmarks for tarstage-core extraction.
//!
//! Compares direct-only extraction against extraction through write buffers
//! of different sizes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use tarstage_core::BoundedWriteBuffer;
use tarstage_core::ExtractOptions;
use tarstage_core::Extractor;
use tarstage_core::test_utils::TarTestBuilder;
use tempfile::TempDir;

/// Archive with many small files spread over a few directories.
fn many_small_files_tar(file_count: usize) -> Vec<u8> {
    (0..file_count)
        .fold(TarTestBuilder::new(), |builder, i| {
            builder.add_sized_file(&format!("package/dir{}/file{i:04}.txt", i % 8), 2048)
        })
        .build()
}

/// Archive mixing small files with a few large ones.
fn mixed_tar() -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for i in 0..200 {
        builder = builder.add_sized_file(&format!("package/small/{i:03}.js"), 4096);
    }
    for i in 0..4 {
        builder = builder.add_sized_file(&format!("package/large/{i}.bin"), 2 * 1024 * 1024);
    }
    builder.build()
}

fn run(data: &[u8], capacity: Option<u64>, threshold: Option<u64>) {
    let temp = TempDir::new().unwrap();
    let buffer = capacity.map(BoundedWriteBuffer::new);
    if let Some(buffer) = &buffer {
        buffer.start().unwrap();
    }

    let extractor = Extractor::new(ExtractOptions::default().with_small_file_threshold(threshold));
    let mut archive = tar::Archive::new(Cursor::new(data));
    extractor
        .extract(archive.entries().unwrap(), temp.path(), buffer.as_ref())
        .unwrap();

    if let Some(buffer) = &buffer {
        buffer.wait_complete().unwrap();
    }
}

fn benchmark_many_small_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_small_files");
    group.sample_size(20);

    for file_count in [100, 1000] {
        let data = many_small_files_tar(file_count);
        group.throughput(Throughput::Elements(file_count as u64));

        group.bench_with_input(BenchmarkId::new("direct", file_count), &data, |b, data| {
            b.iter(|| run(data, None, None));
        });
        group.bench_with_input(
            BenchmarkId::new("buffered_1m", file_count),
            &data,
            |b, data| {
                b.iter(|| run(data, Some(1024 * 1024), None));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("buffered_10m", file_count),
            &data,
            |b, data| {
                b.iter(|| run(data, Some(10 * 1024 * 1024), None));
            },
        );
    }

    group.finish();
}

fn benchmark_mixed_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_sizes");
    group.sample_size(10);
    let data = mixed_tar();
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("direct", |b| b.iter(|| run(&data, None, None)));
    group.bench_function("buffered_no_threshold", |b| {
        b.iter(|| run(&data, Some(10 * 1024 * 1024), None));
    });
    group.bench_function("buffered_threshold_64k", |b| {
        b.iter(|| run(&data, Some(10 * 1024 * 1024), Some(64 * 1024)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_many_small_files, benchmark_mixed_sizes);
criterion_main!(benches);
