//! Chest X-ray analysis: validation gate, preprocessing and classification.
//!
//! ```text
//! base64 → bytes → ImageValidator → preprocess → Classifier → ScanAnalysis
//! ```
//!
//! Validation and inference are CPU-bound and run on the blocking pool.

mod onnx;

pub use onnx::OnnxClassifier;

use std::sync::Arc;

use base64::Engine;
use ndarray::Array4;

use crate::config::ScanConfig;
use crate::error::{PipelineError, ServiceError, ServiceResult};
use crate::pipeline::{preprocess, ImageValidator, Validation};
use crate::types::ScanAnalysis;

/// Message returned for any failure after validation succeeded.
const PROCESSING_FAILED: &str =
    "Failed to process image. It might be corrupted or in an unsupported format.";

/// A binary image classifier returning a sigmoid score for the positive class.
pub trait Classifier: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Score a preprocessed NHWC tensor. Output is expected in [0, 1].
    fn predict(&self, input: &Array4<f32>) -> Result<f32, PipelineError>;
}

/// Validates uploads and classifies the ones that look like chest X-rays.
pub struct ScanAnalyzer {
    validator: ImageValidator,
    classifier: Arc<dyn Classifier>,
    config: ScanConfig,
}

impl ScanAnalyzer {
    pub fn new(
        validator: ImageValidator,
        classifier: Arc<dyn Classifier>,
        config: ScanConfig,
    ) -> Self {
        Self {
            validator,
            classifier,
            config,
        }
    }

    /// Decode a base64 payload and analyze it.
    pub async fn analyze_base64(&self, image_base64: &str) -> ServiceResult<ScanAnalysis> {
        tracing::debug!("Decoding base64 image string ({} chars)", image_base64.len());
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(image_base64.trim())
            .map_err(|e| {
                tracing::warn!("Invalid base64 image payload: {e}");
                ServiceError::InvalidInput(PROCESSING_FAILED.to_string())
            })?;
        self.analyze_bytes(bytes).await
    }

    /// Validate and classify raw image bytes.
    pub async fn analyze_bytes(&self, bytes: Vec<u8>) -> ServiceResult<ScanAnalysis> {
        let validator = self.validator.clone();
        let classifier = self.classifier.clone();
        let image_size = self.config.image_size;

        let score = tokio::task::spawn_blocking(move || {
            score_image(&validator, classifier.as_ref(), &bytes, image_size)
        })
        .await
        .map_err(|e| {
            tracing::error!("Scan analysis task failed: {e}");
            ServiceError::Internal("An internal server error occurred during image analysis.".into())
        })??;

        let analysis = self.interpret(score);
        tracing::info!(
            "Image prediction successful. Class: {}, Confidence: {:.4}",
            analysis.predicted_condition,
            analysis.confidence_score
        );
        Ok(analysis)
    }

    /// Map a sigmoid score to a label and the confidence in that label.
    pub fn interpret(&self, score: f32) -> ScanAnalysis {
        let (negative, positive) = (&self.config.class_names[0], &self.config.class_names[1]);
        if score > self.config.threshold {
            ScanAnalysis {
                predicted_condition: positive.clone(),
                confidence_score: score,
            }
        } else {
            ScanAnalysis {
                predicted_condition: negative.clone(),
                confidence_score: 1.0 - score,
            }
        }
    }
}

fn score_image(
    validator: &ImageValidator,
    classifier: &dyn Classifier,
    bytes: &[u8],
    image_size: u32,
) -> ServiceResult<f32> {
    let image = match validator.validate(bytes) {
        Validation::Accepted(image) => image,
        Validation::Rejected(rejection) => {
            return Err(ServiceError::InvalidInput(rejection.reason));
        }
    };

    let tensor = preprocess(&image.pixels, image_size).map_err(processing_failed)?;
    let score = classifier.predict(&tensor).map_err(processing_failed)?;
    if !score.is_finite() {
        return Err(processing_failed(PipelineError::Inference {
            model: classifier.name().to_string(),
            message: format!("non-finite score {score}"),
        }));
    }
    Ok(score)
}

fn processing_failed(e: PipelineError) -> ServiceError {
    tracing::error!("An error occurred during the image analysis process: {e}");
    ServiceError::InvalidInput(PROCESSING_FAILED.to_string())
}
