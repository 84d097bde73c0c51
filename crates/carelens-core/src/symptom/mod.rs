//! Symptom-based diagnosis prediction.
//!
//! Turns a [`SymptomRequest`] into the model's feature vector, asks the model
//! for a diagnosis and records the outcome in the analytics event log.

mod linear;

pub use linear::LinearDiagnosisModel;

use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::AnalyticsStore;
use crate::error::{PipelineError, ServiceError, ServiceResult};
use crate::types::{ChartData, SymptomRequest};

/// A fitted diagnosis classifier over named features.
pub trait DiagnosisModel: Send + Sync {
    /// Feature columns in the order `predict` expects them.
    fn feature_names(&self) -> &[String];

    /// Predict a diagnosis label from an ordered feature vector.
    fn predict(&self, features: &[f64]) -> Result<String, PipelineError>;
}

impl SymptomRequest {
    /// Named feature columns produced by this request.
    ///
    /// Numeric vitals use their wire names, gender is one-hot encoded as
    /// `Gender_<value>` and each reported symptom becomes its own column.
    pub fn feature_columns(&self) -> HashMap<String, f64> {
        let mut columns = HashMap::from([
            ("Age".to_string(), self.age as f64),
            ("Heart_Rate_bpm".to_string(), self.heart_rate_bpm as f64),
            ("Body_Temperature_C".to_string(), self.body_temperature_c),
            (
                "Oxygen_Saturation_%".to_string(),
                self.oxygen_saturation_percent,
            ),
            ("Systolic_BP".to_string(), self.systolic_bp as f64),
            ("Diastolic_BP".to_string(), self.diastolic_bp as f64),
        ]);
        columns.insert(format!("Gender_{}", self.gender.trim()), 1.0);
        for symptom in &self.symptoms {
            columns.insert(symptom.trim().to_string(), 1.0);
        }
        columns
    }

    /// Feature vector aligned to `names`; columns the request doesn't produce are 0.
    pub fn features_for(&self, names: &[String]) -> Vec<f64> {
        let columns = self.feature_columns();
        let unknown: Vec<&String> = columns
            .keys()
            .filter(|k| !names.contains(k))
            .collect();
        if !unknown.is_empty() {
            tracing::debug!("Ignoring columns unknown to the model: {:?}", unknown);
        }
        names
            .iter()
            .map(|name| columns.get(name).copied().unwrap_or(0.0))
            .collect()
    }
}

/// Diagnosis prediction service.
///
/// The model and the analytics store are optional independently: trends stay
/// available when the model failed to load, and predictions still work when
/// the event log is down.
pub struct SymptomPredictor {
    model: Option<Arc<dyn DiagnosisModel>>,
    store: Option<Arc<AnalyticsStore>>,
}

impl SymptomPredictor {
    pub fn new(model: Option<Arc<dyn DiagnosisModel>>, store: Option<Arc<AnalyticsStore>>) -> Self {
        Self { model, store }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Predict a diagnosis and record it.
    pub fn predict(&self, request: &SymptomRequest) -> ServiceResult<String> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("Model is not available.".to_string()))?;

        tracing::info!(
            "Received prediction request for age: {}, gender: {}",
            request.age,
            request.gender
        );

        let features = request.features_for(model.feature_names());
        let diagnosis = model.predict(&features).map_err(|e| {
            tracing::error!("Error during prediction: {e}");
            ServiceError::Internal("An internal server error occurred.".to_string())
        })?;
        tracing::info!("Prediction successful. Result: {diagnosis}");

        if let Some(store) = &self.store {
            if let Err(e) = store.record_prediction(&diagnosis) {
                tracing::error!("Failed to save prediction to database: {e}");
            }
        }

        Ok(diagnosis)
    }

    /// Daily prediction counts per diagnosis.
    pub fn trends(&self) -> ServiceResult<ChartData> {
        let store = self.store.as_ref().ok_or_else(|| {
            ServiceError::Unavailable("Database connection is not available.".to_string())
        })?;
        store.prediction_trends().map_err(|e| {
            tracing::error!("Error fetching trends: {e}");
            ServiceError::Internal("Could not fetch trend data.".to_string())
        })
    }
}
