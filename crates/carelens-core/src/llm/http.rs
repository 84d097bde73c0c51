//! JSON-over-HTTP plumbing shared by the providers.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PipelineError;

pub(crate) fn llm_error(message: impl Into<String>, status_code: Option<u16>) -> PipelineError {
    PipelineError::Llm {
        message: message.into(),
        status_code,
    }
}

/// POST `body` and decode a JSON reply, tagging failures with `provider`.
///
/// Non-2xx replies keep their status code so retry classification can see it.
pub(crate) async fn post_json<B, R>(
    request: RequestBuilder,
    body: &B,
    timeout: Duration,
    provider: &str,
) -> Result<R, PipelineError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let resp = request
        .json(body)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            let message = if e.is_timeout() {
                format!("{provider} request timed out: {e}")
            } else if e.is_connect() {
                format!("{provider} could not connect: {e}")
            } else {
                format!("{provider} request failed: {e}")
            };
            llm_error(message, None)
        })?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        return Err(llm_error(
            format!("{provider} HTTP {status}: {detail}"),
            Some(status.as_u16()),
        ));
    }

    resp.json::<R>()
        .await
        .map_err(|e| llm_error(format!("Failed to parse {provider} response: {e}"), None))
}
