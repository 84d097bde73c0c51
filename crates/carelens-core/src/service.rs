//! Explicitly constructed service container.
//!
//! Every service is built independently at startup. One that fails to
//! initialize is logged and left out, and its accessor then reports
//! [`ServiceError::Unavailable`] so callers can answer 503.

use std::sync::Arc;

use crate::analytics::AnalyticsStore;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::llm::{LlmProvider, LlmProviderFactory};
use crate::pipeline::ImageValidator;
use crate::scan::{OnnxClassifier, ScanAnalyzer};
use crate::symptom::{DiagnosisModel, LinearDiagnosisModel, SymptomPredictor};

/// The services behind the HTTP API.
#[derive(Default)]
pub struct Services {
    scan: Option<ScanAnalyzer>,
    symptoms: Option<SymptomPredictor>,
    assistant: Option<Assistant>,
}

impl Services {
    /// Build every service from config. Never fails; missing pieces are logged.
    pub fn initialize(config: &Config) -> Self {
        let store = match AnalyticsStore::open(&config.database_path()) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::error!("Could not open analytics database: {e}");
                None
            }
        };

        Self {
            scan: Self::init_scan(config),
            symptoms: Some(SymptomPredictor::new(
                Self::init_symptom_model(config),
                store.clone(),
            )),
            assistant: Self::init_assistant(config, store),
        }
    }

    fn init_scan(config: &Config) -> Option<ScanAnalyzer> {
        let path = config.scan_model_path();
        match OnnxClassifier::load(&path) {
            Ok(classifier) => Some(ScanAnalyzer::new(
                ImageValidator::new(config.validator.clone()),
                Arc::new(classifier),
                config.scan.clone(),
            )),
            Err(e) => {
                tracing::error!("Failed to load image analysis model: {e}");
                None
            }
        }
    }

    fn init_symptom_model(config: &Config) -> Option<Arc<dyn DiagnosisModel>> {
        match LinearDiagnosisModel::load(&config.symptom_model_path()) {
            Ok(model) => {
                tracing::info!("Diagnosis model loaded ({} classes)", model.classes().len());
                Some(Arc::new(model))
            }
            Err(e) => {
                tracing::error!("Failed to load diagnosis model: {e}");
                None
            }
        }
    }

    fn init_assistant(config: &Config, store: Option<Arc<AnalyticsStore>>) -> Option<Assistant> {
        let settings = &config.assistant;
        if !settings.enabled {
            tracing::info!("Assistant disabled in config");
            return None;
        }

        let provider: Arc<dyn LlmProvider> =
            match LlmProviderFactory::create(&settings.provider, &config.llm, settings.model.as_deref()) {
                Ok(provider) => Arc::from(provider),
                Err(e) => {
                    tracing::error!("Could not initialize AI Assistant services: {e}");
                    return None;
                }
            };
        tracing::info!("Assistant using {} provider", provider.name());

        Some(Assistant::from_provider(provider, None, store, settings))
    }

    pub fn with_scan(mut self, scan: ScanAnalyzer) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn with_symptoms(mut self, symptoms: SymptomPredictor) -> Self {
        self.symptoms = Some(symptoms);
        self
    }

    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn scan(&self) -> ServiceResult<&ScanAnalyzer> {
        self.scan.as_ref().ok_or_else(|| {
            ServiceError::Unavailable(
                "Image analysis model is not available. Check server startup logs for errors."
                    .to_string(),
            )
        })
    }

    pub fn symptoms(&self) -> ServiceResult<&SymptomPredictor> {
        self.symptoms
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("Model is not available.".to_string()))
    }

    pub fn assistant(&self) -> ServiceResult<&Assistant> {
        self.assistant.as_ref().ok_or_else(|| {
            ServiceError::Unavailable("Chatbot service is currently unavailable.".to_string())
        })
    }
}
