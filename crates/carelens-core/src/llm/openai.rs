//! OpenAI-compatible provider using the Chat Completions API.
//!
//! Any backend that speaks the same protocol works by pointing `endpoint` at
//! it, which is how Gemini and self-hosted gateways are reached.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{llm_error, post_json};
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;

pub struct OpenAiProvider {
    completions_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// `endpoint` is the API base URL, without `/chat/completions`.
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            completions_url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let started = Instant::now();
        let body = CompletionBody {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let http = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key);
        let completion: Completion = post_json(http, &body, self.timeout(), "OpenAI").await?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| llm_error("OpenAI returned no completion text", None))?;

        Ok(LlmResponse {
            text: text.trim().to_string(),
            model: completion.model.unwrap_or_else(|| self.model.clone()),
            tokens_used: completion.usage.map(|u| u.total_tokens),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_is_normalized() {
        let provider = OpenAiProvider::new("https://api.example.com/v1/", "key", "m");
        assert_eq!(
            provider.completions_url,
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_shape() {
        let body = CompletionBody {
            model: "gpt-4o-mini",
            messages: [Message {
                role: "user",
                content: "What causes asthma?",
            }],
            max_tokens: 256,
            temperature: 0.3,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "What causes asthma?");
        assert_eq!(value["max_tokens"], 256);
    }

    #[test]
    fn test_completion_without_usage() {
        let completion: Completion =
            serde_json::from_str(r#"{"choices": [{"message": {"content": " Influenza "}}]}"#)
                .unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some(" Influenza ")
        );
        assert!(completion.model.is_none());
        assert!(completion.usage.is_none());
    }
}
