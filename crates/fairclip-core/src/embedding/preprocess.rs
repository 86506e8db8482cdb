//! Image preprocessing for CLIP vision towers.
//!
//! CLIP expects:
//! - Shortest side resized to `image_size` (bicubic), then center-cropped square
//! - Channel order: RGB, scaled to [0, 1]
//! - Per-channel normalization with the checkpoint's mean/std
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Normalization constants for one checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessSpec {
    pub image_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// Preprocess an image for CLIP inference.
pub fn preprocess(image: &DynamicImage, spec: &PreprocessSpec) -> Array4<f32> {
    let cropped = image.resize_to_fill(
        spec.image_size,
        spec.image_size,
        image::imageops::FilterType::CatmullRom,
    );
    let rgb = cropped.to_rgb8();

    let size = spec.image_size as usize;
    let plane = size * size;
    let mut data = vec![0f32; CHANNELS * plane];

    // NCHW layout: offset = c * size * size + y * size + x
    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        for (c, &val) in pixel.iter().enumerate() {
            data[c * plane + i] = (val as f32 / 255.0 - spec.mean[c]) / spec.std[c];
        }
    }

    // Length always matches the shape.
    Array4::from_shape_vec((1, CHANNELS, size, size), data)
        .unwrap_or_else(|_| Array4::zeros((1, CHANNELS, size, size)))
}
