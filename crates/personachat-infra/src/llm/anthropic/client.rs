//! AnthropicProvider -- [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Messages API (`/v1/messages`). The API key is held
//! as a [`SecretString`] and only exposed when building request headers.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use personachat_core::llm::provider::LlmProvider;
use personachat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, Usage,
};

use super::types::{
    AnthropicContentBlock, AnthropicErrorEnvelope, AnthropicMessage, AnthropicRequest,
    AnthropicResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Claude provider.
///
/// Does not derive `Debug`; the request client and key stay out of logs.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a provider whose requests give up after `timeout`.
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (proxies, local gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_anthropic_request(request: &CompletionRequest) -> AnthropicRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }
}

/// Map a non-success HTTP status and its body to an [`LlmError`].
fn map_status(status: u16, body: &str) -> LlmError {
    let detail = serde_json::from_str::<AnthropicErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        400 => LlmError::InvalidRequest(detail),
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(detail),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        Some("refusal") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

fn into_completion(resp: AnthropicResponse) -> CompletionResponse {
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    CompletionResponse {
        id: resp.id,
        content,
        model: resp.model,
        stop_reason: map_stop_reason(resp.stop_reason.as_deref()),
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_anthropic_request(request);

        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &error_body));
        }

        let anthropic_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(into_completion(anthropic_resp))
    }
}
