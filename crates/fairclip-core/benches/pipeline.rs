//! Benchmarks for the CPU-side stages around model inference.
//!
//! Run with: cargo bench -p fairclip-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fairclip_core::classifier::{logits, Classifier, DEFAULT_LOGIT_SCALE};
use fairclip_core::embedding::{preprocess, PreprocessSpec};
use fairclip_core::registry::{CLIP_MEAN, CLIP_STD};
use fairclip_core::LabelSet;
use image::DynamicImage;
use ndarray::Array2;

/// Deterministic pseudo-random unit vector.
fn unit_vector(dim: usize, seed: usize) -> Vec<f32> {
    let v: Vec<f32> = (0..dim)
        .map(|i| ((i * 31 + seed * 17) as f32 * 0.013).sin())
        .collect();
    fairclip_core::math::l2_normalize(&v)
}

fn benchmark_preprocess(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(448, 448);
    let spec = PreprocessSpec {
        image_size: 224,
        mean: CLIP_MEAN,
        std: CLIP_STD,
    };

    c.bench_function("preprocess_224", |b| {
        b.iter(|| preprocess(black_box(&img), &spec))
    });
}

fn benchmark_logits(c: &mut Criterion) {
    let dim = 512;
    let prompts = 14;
    let flat: Vec<f32> = (0..prompts).flat_map(|i| unit_vector(dim, i)).collect();
    let text = Array2::from_shape_vec((prompts, dim), flat).unwrap();
    let image = unit_vector(dim, 99);

    c.bench_function("logits_14x512", |b| {
        b.iter(|| logits(black_box(&image), &text, DEFAULT_LOGIT_SCALE))
    });
}

fn benchmark_predict_argp(c: &mut Criterion) {
    let dim = 512;
    let n = LabelSet::Argp.prompts().len();
    let embeddings = (0..n).map(|i| unit_vector(dim, i)).collect();
    let classifier =
        Classifier::from_embeddings(LabelSet::Argp, embeddings, DEFAULT_LOGIT_SCALE).unwrap();
    let image = unit_vector(dim, 7);

    c.bench_function("predict_argp", |b| {
        b.iter(|| classifier.predict(black_box(&image)))
    });
}

criterion_group!(
    benches,
    benchmark_preprocess,
    benchmark_logits,
    benchmark_predict_argp,
);
criterion_main!(benches);
