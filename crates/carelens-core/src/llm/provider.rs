//! Provider abstraction for the assistant's language model.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use super::http::llm_error;
use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;
use crate::config::LlmConfig;
use crate::error::PipelineError;

/// One completion call: a fully rendered prompt plus sampling settings.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, trimmed
    pub text: String,
    /// Model that answered, as reported by the backend when available
    pub model: String,
    /// Prompt plus completion tokens, if reported
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// A text-completion backend.
///
/// `async_trait` keeps the trait object-safe so services can hold
/// `Arc<dyn LlmProvider>`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Whether the backend is configured and answering.
    async fn is_available(&self) -> bool;

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout.
    fn timeout(&self) -> Duration;
}

/// Supported backends, as named in `[assistant] provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = PipelineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(llm_error(format!("Unknown LLM provider: {other}"), None)),
        }
    }
}

/// Expand a `${VAR}` reference; plain values pass through and empty means unset.
pub fn resolve_env_var(value: &str) -> Option<String> {
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
        None if value.is_empty() => None,
        None => Some(value.to_string()),
    }
}

/// Builds providers from the `[llm]` config section.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the named provider, optionally overriding its configured model.
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn LlmProvider>, PipelineError> {
        match provider.parse::<ProviderKind>()? {
            ProviderKind::Ollama => {
                let cfg = config.ollama.clone().unwrap_or_default();
                let model = model_override.unwrap_or(cfg.model.as_str());
                Ok(Box::new(OllamaProvider::new(&cfg.endpoint, model)))
            }
            ProviderKind::OpenAi => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    llm_error(
                        "OpenAI API key not set. Set OPENAI_API_KEY or [llm.openai] api_key.",
                        None,
                    )
                })?;
                let model = model_override.unwrap_or(cfg.model.as_str());
                Ok(Box::new(OpenAiProvider::new(&cfg.endpoint, &api_key, model)))
            }
        }
    }
}
