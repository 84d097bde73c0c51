//! Medical information assistant.
//!
//! Chat answers come from a [`ChatChain`] (retrieval-augmented by default),
//! report summaries from a [`Summarizer`]. Each chat question is also tagged
//! with a medical topic that feeds the "common queries" chart.

pub mod pdf;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::analytics::AnalyticsStore;
use crate::config::AssistantConfig;
use crate::error::{PipelineError, ServiceError, ServiceResult};
use crate::llm::{generate_with_retry, LlmProvider, LlmRequest};
use crate::types::{ChartData, SummarizeRequest};

/// Number of topics shown in the common-queries chart.
const TOP_TOPICS: usize = 5;

/// Token cap for topic extraction; topics are a word or two.
const TOPIC_MAX_TOKENS: u32 = 16;

/// Source of context passages for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<String>, PipelineError>;
}

/// Answers a question given the prior conversation.
#[async_trait]
pub trait ChatChain: Send + Sync {
    async fn ask(&self, question: &str, history: &[Vec<String>]) -> Result<String, PipelineError>;
}

/// Produces a patient-friendly summary of a medical document.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, PipelineError>;
}

/// Call settings shared by the LLM-backed chains.
#[derive(Debug, Clone)]
struct CallSettings {
    max_tokens: u32,
    temperature: f32,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl From<&AssistantConfig> for CallSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

impl CallSettings {
    async fn complete(&self, provider: &dyn LlmProvider, prompt: String) -> Result<String, PipelineError> {
        let request = LlmRequest::new(prompt, self.max_tokens, self.temperature);
        let response =
            generate_with_retry(provider, &request, self.retry_attempts, self.retry_delay_ms)
                .await?;
        Ok(response.text)
    }
}

/// Chat chain that stuffs retrieved passages and history into one prompt.
pub struct LlmChatChain {
    provider: Arc<dyn LlmProvider>,
    retriever: Option<Arc<dyn Retriever>>,
    retrieval_k: usize,
    settings: CallSettings,
}

impl LlmChatChain {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        retriever: Option<Arc<dyn Retriever>>,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            provider,
            retriever,
            retrieval_k: config.retrieval_k,
            settings: CallSettings::from(config),
        }
    }
}

#[async_trait]
impl ChatChain for LlmChatChain {
    async fn ask(&self, question: &str, history: &[Vec<String>]) -> Result<String, PipelineError> {
        let context = match &self.retriever {
            Some(retriever) => retriever.retrieve(question, self.retrieval_k).await?,
            None => Vec::new(),
        };
        tracing::debug!(passages = context.len(), "Retrieved context");
        let prompt = prompts::chat_prompt(&context, history, question);
        self.settings.complete(self.provider.as_ref(), prompt).await
    }
}

/// Single-call summarizer.
pub struct LlmSummarizer {
    provider: Arc<dyn LlmProvider>,
    settings: CallSettings,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AssistantConfig) -> Self {
        Self {
            provider,
            settings: CallSettings::from(config),
        }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, PipelineError> {
        let prompt = prompts::summary_prompt(text);
        self.settings.complete(self.provider.as_ref(), prompt).await
    }
}

/// Chat, summarization and query-topic analytics.
pub struct Assistant {
    chain: Arc<dyn ChatChain>,
    summarizer: Arc<dyn Summarizer>,
    topic_provider: Option<Arc<dyn LlmProvider>>,
    store: Option<Arc<AnalyticsStore>>,
    temperature: f32,
}

impl Assistant {
    pub fn new(
        chain: Arc<dyn ChatChain>,
        summarizer: Arc<dyn Summarizer>,
        topic_provider: Option<Arc<dyn LlmProvider>>,
        store: Option<Arc<AnalyticsStore>>,
    ) -> Self {
        Self {
            chain,
            summarizer,
            topic_provider,
            store,
            temperature: AssistantConfig::default().temperature,
        }
    }

    /// Wire the default LLM chains around a single provider.
    pub fn from_provider(
        provider: Arc<dyn LlmProvider>,
        retriever: Option<Arc<dyn Retriever>>,
        store: Option<Arc<AnalyticsStore>>,
        config: &AssistantConfig,
    ) -> Self {
        let chain = Arc::new(LlmChatChain::new(provider.clone(), retriever, config));
        let summarizer = Arc::new(LlmSummarizer::new(provider.clone(), config));
        Self {
            chain,
            summarizer,
            topic_provider: Some(provider),
            store,
            temperature: config.temperature,
        }
    }

    /// Answer a question, recording its medical topic on the way.
    pub async fn chat(&self, question: &str, history: &[Vec<String>]) -> ServiceResult<String> {
        tracing::info!("Received chat request: '{question}'");

        if let Some(topic) = self.extract_topic(question).await {
            self.save_topic(&topic);
        }

        self.chain.ask(question, history).await.map_err(|e| {
            tracing::error!("Error in chat chain: {e}");
            ServiceError::Internal(
                "An error occurred while processing the chat request.".to_string(),
            )
        })
    }

    /// Summarize raw text or a base64-encoded PDF.
    pub async fn summarize(&self, request: &SummarizeRequest) -> ServiceResult<String> {
        tracing::info!("Received summarization request.");

        let text = match (&request.raw_text, &request.pdf_base64) {
            (Some(text), None) => text.clone(),
            (None, Some(pdf)) => Self::pdf_text(pdf).await?,
            _ => {
                return Err(ServiceError::InvalidInput(
                    "Exactly one of \"pdf_base64\" or \"raw_text\" must be provided.".to_string(),
                ))
            }
        };

        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "No content provided for summarization.".to_string(),
            ));
        }

        self.summarizer.summarize(&text).await.map_err(|e| {
            tracing::error!("Error in summarization chain: {e}");
            ServiceError::Internal("An error occurred during summarization.".to_string())
        })
    }

    /// The most frequent chat topics as a bar chart.
    pub fn query_topics(&self) -> ServiceResult<ChartData> {
        let store = self.store.as_ref().ok_or_else(|| {
            ServiceError::Unavailable("Database connection is not available.".to_string())
        })?;
        tracing::info!("Fetching top {TOP_TOPICS} query topics from database.");
        store.top_query_topics(TOP_TOPICS).map_err(|e| {
            tracing::error!("Error fetching query topics: {e}");
            ServiceError::Internal("Could not fetch query topic data.".to_string())
        })
    }

    async fn pdf_text(pdf_base64: &str) -> ServiceResult<String> {
        let unreadable = || ServiceError::InvalidInput("Could not read the uploaded PDF file.".to_string());

        let bytes = STANDARD.decode(pdf_base64.trim()).map_err(|e| {
            tracing::error!("Failed to decode uploaded PDF: {e}");
            unreadable()
        })?;

        tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
            .await
            .map_err(|e| ServiceError::Internal(format!("PDF extraction task failed: {e}")))?
            .map_err(|e| {
                tracing::error!("Failed to process uploaded PDF: {e}");
                unreadable()
            })
    }

    async fn extract_topic(&self, question: &str) -> Option<String> {
        let provider = self.topic_provider.as_ref()?;
        let request = LlmRequest::new(prompts::topic_prompt(question), TOPIC_MAX_TOKENS, self.temperature);
        match provider.generate(&request).await {
            Ok(response) => normalize_topic(&response.text),
            Err(e) => {
                tracing::error!("Error during topic extraction: {e}");
                None
            }
        }
    }

    fn save_topic(&self, topic: &str) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.record_query_topic(topic) {
            tracing::error!("Failed to save query topic: {e}");
        }
    }
}

/// Normalize an extracted topic; any mention of "none" means no topic.
pub fn normalize_topic(raw: &str) -> Option<String> {
    if raw.to_lowercase().contains("none") {
        return None;
    }
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
}
