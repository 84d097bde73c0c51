//! Retrying wrapper for transient provider failures.

use std::time::Duration;

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;

const MAX_BACKOFF_MS: u64 = 30_000;

/// True for timeouts, HTTP 429 and 5xx, and transport errors without a status.
///
/// When a status code is present it decides alone; message text is only
/// consulted for connection-level failures.
pub fn is_retryable(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } => true,
        PipelineError::Llm {
            status_code: Some(code),
            ..
        } => *code == 429 || (500..600).contains(code),
        PipelineError::Llm {
            status_code: None,
            message,
        } => ["timed out", "connect"].iter().any(|hint| message.contains(hint)),
        _ => false,
    }
}

/// `base_delay_ms * 2^attempt`, capped at 30s.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Call `provider`, retrying retryable failures at most `retry_attempts` times.
pub async fn generate_with_retry(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    retry_attempts: u32,
    retry_delay_ms: u64,
) -> Result<LlmResponse, PipelineError> {
    let mut attempt = 0;
    loop {
        let err = match provider.generate(request).await {
            Ok(response) => {
                tracing::debug!(
                    provider = provider.name(),
                    latency_ms = response.latency_ms,
                    tokens = ?response.tokens_used,
                    "completion received"
                );
                return Ok(response);
            }
            Err(err) => err,
        };

        if attempt >= retry_attempts || !is_retryable(&err) {
            return Err(err);
        }

        let delay = backoff_duration(attempt, retry_delay_ms);
        tracing::warn!(
            provider = provider.name(),
            attempt = attempt + 1,
            ?delay,
            "completion failed, retrying: {err}"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
