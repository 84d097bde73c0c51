//! Linear diagnosis model loaded from an exported JSON description.
//!
//! The export holds the fitted logistic-regression parameters:
//!
//! ```json
//! {
//!   "features": ["Age", "Heart_Rate_bpm", "Gender_Female", "Cough", ...],
//!   "classes": ["Bronchitis", "Cold", "Flu", "Healthy", "Pneumonia"],
//!   "coefficients": [[...], ...],
//!   "intercepts": [...]
//! }
//! ```
//!
//! Multinomial models have one coefficient row per class and predict the
//! argmax of `W·x + b`. Binary models have a single row and predict
//! `classes[1]` when the score is positive.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::error::PipelineError;

use super::DiagnosisModel;

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    features: Vec<String>,
    classes: Vec<String>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

/// Fitted linear classifier over named features.
#[derive(Debug, Clone)]
pub struct LinearDiagnosisModel {
    features: Vec<String>,
    classes: Vec<String>,
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LinearDiagnosisModel {
    /// Load the model from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Inference {
            model: path.display().to_string(),
            message: format!("Cannot read model file: {e}"),
        })?;
        let model = Self::from_json(&content).map_err(|e| match e {
            PipelineError::Inference { message, .. } => PipelineError::Inference {
                model: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::info!(
            "Loaded diagnosis model from {:?} ({} features, {} classes)",
            path,
            model.features.len(),
            model.classes.len()
        );
        Ok(model)
    }

    /// Parse and check a JSON model description.
    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        let file: LinearModelFile =
            serde_json::from_str(content).map_err(|e| model_error(format!("Invalid model JSON: {e}")))?;

        let n_features = file.features.len();
        let rows = file.coefficients.len();

        if file.classes.len() < 2 {
            return Err(model_error("model must have at least two classes".into()));
        }
        let binary = rows == 1 && file.classes.len() == 2;
        if !binary && rows != file.classes.len() {
            return Err(model_error(format!(
                "expected {} coefficient rows, found {rows}",
                file.classes.len()
            )));
        }
        if file.intercepts.len() != rows {
            return Err(model_error(format!(
                "expected {rows} intercepts, found {}",
                file.intercepts.len()
            )));
        }
        if let Some(bad) = file.coefficients.iter().position(|r| r.len() != n_features) {
            return Err(model_error(format!(
                "coefficient row {bad} does not have {n_features} entries"
            )));
        }

        let flat: Vec<f64> = file.coefficients.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((rows, n_features), flat)
            .map_err(|e| model_error(format!("Bad coefficient matrix: {e}")))?;

        Ok(Self {
            features: file.features,
            classes: file.classes,
            weights,
            intercepts: Array1::from(file.intercepts),
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl DiagnosisModel for LinearDiagnosisModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &[f64]) -> Result<String, PipelineError> {
        if features.len() != self.features.len() {
            return Err(model_error(format!(
                "expected {} features, got {}",
                self.features.len(),
                features.len()
            )));
        }

        let x = Array1::from(features.to_vec());
        let scores = self.weights.dot(&x) + &self.intercepts;

        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            scores
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &s)| {
                    if s > best.1 {
                        (i, s)
                    } else {
                        best
                    }
                })
                .0
        };

        Ok(self.classes[index].clone())
    }
}

fn model_error(message: String) -> PipelineError {
    PipelineError::Inference {
        model: "linear-diagnosis".to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTICLASS: &str = r#"{
        "features": ["Body_Temperature_C", "Cough", "Fever"],
        "classes": ["Cold", "Flu", "Healthy"],
        "coefficients": [[0.0, 1.0, 0.0], [0.1, 0.5, 2.0], [-0.1, -1.0, -1.0]],
        "intercepts": [0.0, -3.5, 4.0]
    }"#;

    #[test]
    fn test_multiclass_argmax() {
        let model = LinearDiagnosisModel::from_json(MULTICLASS).unwrap();
        // Cold: 1.0, Flu: 3.85 + 0.5 + 2.0 - 3.5 = 2.85, Healthy: -3.85 - 2 + 4 = -1.85
        assert_eq!(model.predict(&[38.5, 1.0, 1.0]).unwrap(), "Flu");
        // Cold: 0, Flu: 3.68 - 3.5 = 0.18, Healthy: -3.68 + 4 = 0.32
        assert_eq!(model.predict(&[36.8, 0.0, 0.0]).unwrap(), "Healthy");
    }

    #[test]
    fn test_binary_model_uses_sign() {
        let model = LinearDiagnosisModel::from_json(
            r#"{"features": ["Fever"], "classes": ["Healthy", "Flu"],
                "coefficients": [[2.0]], "intercepts": [-1.0]}"#,
        )
        .unwrap();
        assert_eq!(model.predict(&[1.0]).unwrap(), "Flu");
        assert_eq!(model.predict(&[0.0]).unwrap(), "Healthy");
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let err = LinearDiagnosisModel::from_json(
            r#"{"features": ["a", "b"], "classes": ["x", "y", "z"],
                "coefficients": [[1.0, 2.0], [3.0, 4.0]], "intercepts": [0.0, 0.0]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("coefficient rows"));
    }

    #[test]
    fn test_rejects_short_coefficient_row() {
        let err = LinearDiagnosisModel::from_json(
            r#"{"features": ["a", "b"], "classes": ["x", "y"],
                "coefficients": [[1.0]], "intercepts": [0.0]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let model = LinearDiagnosisModel::from_json(MULTICLASS).unwrap();
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnosis_model.json");
        std::fs::write(&path, MULTICLASS).unwrap();
        let model = LinearDiagnosisModel::load(&path).unwrap();
        assert_eq!(model.classes().len(), 3);
        assert_eq!(model.feature_names()[1], "Cough");
    }

    #[test]
    fn test_load_missing_file() {
        let err = LinearDiagnosisModel::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(err.to_string().contains("Cannot read model file"));
    }
}
