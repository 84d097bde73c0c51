//! Benchmarks for the X-ray intake validator.
//!
//! Run with: cargo bench -p carelens-core

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use carelens_core::pipeline::{preprocess, ColorStats, ImageDecoder, ImageValidator};

/// A radiograph-like grayscale PNG: a vertical ramp with a bright center band.
fn synthetic_xray_png(size: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(size, size, |x, y| {
        let ramp = (y * 200 / size) as u8 + 20;
        if x > size / 3 && x < 2 * size / 3 {
            Luma([ramp.saturating_add(30)])
        } else {
            Luma([ramp])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn benchmark_validate(c: &mut Criterion) {
    let validator = ImageValidator::default();
    let bytes = synthetic_xray_png(1024);

    c.bench_function("validate_png_1024", |b| {
        b.iter(|| validator.validate(black_box(&bytes)))
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let bytes = synthetic_xray_png(1024);

    c.bench_function("decode_png_1024", |b| {
        b.iter(|| ImageDecoder::decode_bytes(black_box(&bytes)))
    });
}

fn benchmark_color_stats(c: &mut Criterion) {
    let pixels = RgbImage::from_fn(2048, 2048, |x, y| {
        let v = ((x + y) % 256) as u8;
        image::Rgb([v, v, v])
    });

    c.bench_function("color_stats_2048", |b| {
        b.iter(|| ColorStats::measure(black_box(&pixels)))
    });
}

fn benchmark_preprocess(c: &mut Criterion) {
    let pixels = RgbImage::new(1024, 1024);

    c.bench_function("preprocess_224", |b| {
        b.iter(|| preprocess(black_box(&pixels), 224))
    });
}

criterion_group!(
    benches,
    benchmark_validate,
    benchmark_decode,
    benchmark_color_stats,
    benchmark_preprocess,
);
criterion_main!(benches);
