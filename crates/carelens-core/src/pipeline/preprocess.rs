//! Image preprocessing for the chest X-ray classifier.
//!
//! The classifier was trained in Keras and expects:
//! - Input size: `image_size × image_size` (224 by default)
//! - Normalization: pixels scaled to [0, 1] via pixel / 255
//! - Channel order: RGB
//! - Tensor layout: NHWC [batch, height, width, channels]

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

use crate::error::PipelineError;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Preprocess an RGB image for classifier inference.
pub fn preprocess(pixels: &RgbImage, image_size: u32) -> Result<Array4<f32>, PipelineError> {
    let resized = image::imageops::resize(pixels, image_size, image_size, FilterType::Triangle);

    let size = image_size as usize;
    let raw: Vec<f32> = resized
        .as_raw()
        .iter()
        .map(|&v| v as f32 / 255.0)
        .collect();

    // The resized buffer is already row-major HWC, so it maps straight onto NHWC.
    Array4::from_shape_vec((1, size, size, CHANNELS), raw).map_err(|e| PipelineError::Inference {
        model: "preprocess".to_string(),
        message: format!("Failed to build input tensor: {e}"),
    })
}
