//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where model artifacts are stored
    pub model_dir: PathBuf,

    /// SQLite file backing the analytics event log
    pub database_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.carelens/models"),
            database_path: PathBuf::from("~/.carelens/predictions.db"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Origins allowed by CORS. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
                "http://127.0.0.1:5500".to_string(),
            ],
        }
    }
}

/// Thresholds for the X-ray heuristic validator.
///
/// The color, brightness and contrast defaults were tuned empirically against
/// real uploads. They are starting points, not calibrated constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Minimum image width in pixels
    pub min_width: u32,

    /// Minimum image height in pixels
    pub min_height: u32,

    /// Maximum image width in pixels
    pub max_width: u32,

    /// Maximum image height in pixels
    pub max_height: u32,

    /// Accepted width/height ratio. Stored but not enforced: radiographs
    /// come in too many formats for a ratio check to be useful.
    pub aspect_ratio_range: (f64, f64),

    /// Maximum mean pairwise channel difference before an image counts as color
    pub max_color_diff: f64,

    /// Lowest acceptable mean luminance (0-255)
    pub min_brightness: f64,

    /// Highest acceptable mean luminance (0-255)
    pub max_brightness: f64,

    /// Lowest acceptable luminance standard deviation
    pub min_contrast: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 100,
            max_width: 5000,
            max_height: 5000,
            aspect_ratio_range: (0.5, 2.0),
            max_color_diff: 12.0,
            min_brightness: 15.0,
            max_brightness: 240.0,
            min_contrast: 10.0,
        }
    }
}

/// Chest X-ray classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// ONNX model file, relative to `general.model_dir`
    pub model_file: String,

    /// Square input size expected by the model
    pub image_size: u32,

    /// Labels for scores at or below / above the threshold
    pub class_names: Vec<String>,

    /// Sigmoid score above which the second class is predicted
    pub threshold: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model_file: "xray_classifier.onnx".to_string(),
            image_size: 224,
            class_names: vec!["NORMAL".to_string(), "Pneumonia".to_string()],
            threshold: 0.5,
        }
    }
}

/// Symptom-based diagnosis model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomConfig {
    /// Exported linear model (JSON), relative to `general.model_dir`
    pub model_file: String,
}

impl Default for SymptomConfig {
    fn default() -> Self {
        Self {
            model_file: "diagnosis_model.json".to_string(),
        }
    }
}

/// Medical assistant (chat and summarization) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Whether to start the assistant at all
    pub enabled: bool,

    /// LLM provider name ("ollama" or "openai")
    pub provider: String,

    /// Optional model override for the selected provider
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Number of context passages requested from the retriever
    pub retrieval_k: usize,

    /// Max retry attempts for transient LLM failures
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: None,
            temperature: 0.3,
            max_tokens: 1024,
            retrieval_k: 3,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama (local) configuration
    pub ollama: Option<OllamaConfig>,

    /// OpenAI-compatible configuration
    pub openai: Option<OpenAiConfig>,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
        }
    }
}

/// OpenAI-compatible Chat Completions configuration.
///
/// Any service speaking the same protocol works by changing `endpoint`
/// (e.g. Gemini's `https://generativelanguage.googleapis.com/v1beta/openai`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL (without `/chat/completions`)
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}
