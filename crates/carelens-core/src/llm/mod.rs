//! Language-model access for the medical assistant.
//!
//! A small provider abstraction over Ollama and OpenAI-compatible backends,
//! with capped exponential backoff for transient failures.

mod http;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod retry;

pub use provider::{
    resolve_env_var, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse, ProviderKind,
};
pub use retry::{backoff_duration, generate_with_retry, is_retryable};
