//! ONNX Runtime session for the chest X-ray classifier.
//!
//! The model is a Keras DenseNet exported to ONNX: one NHWC float input and a
//! single sigmoid output of shape [1, 1].

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::Classifier;

/// Wraps an ONNX Runtime session for binary X-ray classification.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load a classifier from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(inference_error(
                model_path,
                format!("Model file not found at {}", model_path.display()),
            ));
        }

        let session = Session::builder()
            .map_err(|e| {
                inference_error(model_path, format!("Failed to create ONNX session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| inference_error(model_path, format!("Failed to load ONNX model: {e}")))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input_1".to_string());

        tracing::info!(
            "Loaded image analysis model from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx-xray"
    }

    fn predict(&self, input: &Array4<f32>) -> Result<f32, PipelineError> {
        // Convert ndarray to (shape, flat_data) for ort.
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = input.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data)).map_err(|e| {
            inference_error(&self.model_path, format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| {
            inference_error(&self.model_path, format!("Session lock poisoned: {e}"))
        })?;

        let outputs = session
            .run(inputs)
            .map_err(|e| inference_error(&self.model_path, format!("ONNX inference failed: {e}")))?;

        let (_, output) = outputs.iter().next().ok_or_else(|| {
            inference_error(&self.model_path, "Model produced no outputs".to_string())
        })?;

        let (_, data) = output.try_extract_tensor::<f32>().map_err(|e| {
            inference_error(&self.model_path, format!("Failed to extract output tensor: {e}"))
        })?;

        data.first().copied().ok_or_else(|| {
            inference_error(&self.model_path, "Model produced an empty output".to_string())
        })
    }
}

fn inference_error(model_path: &Path, message: String) -> PipelineError {
    PipelineError::Inference {
        model: model_path.display().to_string(),
        message,
    }
}
