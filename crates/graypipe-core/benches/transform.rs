//! Benchmarks for the pipeline transforms.
//!
//! Run with: cargo bench -p graypipe-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graypipe_core::pipeline::{grayscale, ImageCodec, Resizer};
use image::DynamicImage;

fn benchmark_resize(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);
    let resizer = Resizer::default();

    c.bench_function("resize_exact_lanczos3_500", |b| {
        b.iter(|| resizer.resize(black_box(&img)))
    });
}

fn benchmark_grayscale(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(500, 500);

    c.bench_function("grayscale_500", |b| b.iter(|| grayscale(black_box(&img))));
}

fn benchmark_encode(c: &mut Criterion) {
    let img = DynamicImage::new_luma8(500, 500);
    let codec = ImageCodec::default();
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Skipping encode benchmark: {}", e);
            return;
        }
    };
    let path = dir.path().join("bench.jpeg");

    c.bench_function("encode_jpeg_500", |b| {
        b.iter(|| {
            let _ = codec.encode(black_box(&img), &path);
        })
    });
}

criterion_group!(
    benches,
    benchmark_resize,
    benchmark_grayscale,
    benchmark_encode
);
criterion_main!(benches);
