//! Local inference through an Ollama server (`/api/generate`, no auth).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{llm_error, post_json};
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct Generated {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl Generated {
    fn total_tokens(&self) -> Option<u32> {
        Some(self.prompt_eval_count? + self.eval_count?)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let started = Instant::now();
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let http = self.client.post(format!("{}/api/generate", self.base_url));
        let generated: Generated = post_json(http, &body, self.timeout(), "Ollama").await?;

        let text = generated.response.trim();
        if text.is_empty() {
            return Err(llm_error("Ollama returned an empty response", None));
        }

        Ok(LlmResponse {
            text: text.to_string(),
            model: self.model.clone(),
            tokens_used: generated.total_tokens(),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        // CPU-only hosts are slow
        Duration::from_secs(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_disables_streaming() {
        let body = GenerateBody {
            model: "llama3.1",
            prompt: "hi",
            stream: false,
            options: Options {
                temperature: 0.3,
                num_predict: 64,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 64);
    }

    #[test]
    fn test_token_counts_are_optional() {
        let partial: Generated =
            serde_json::from_str(r#"{"response": "ok", "eval_count": 3}"#).unwrap();
        assert_eq!(partial.total_tokens(), None);

        let full: Generated = serde_json::from_str(
            r#"{"response": "ok", "prompt_eval_count": 10, "eval_count": 3}"#,
        )
        .unwrap();
        assert_eq!(full.total_tokens(), Some(13));
    }
}
