//! LLM request/response types.
//!
//! Provider-neutral shapes for completion requests, the model catalogue and
//! the error surface shared by every provider client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single turn in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Reason why the LLM stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ContentFilter,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::ContentFilter => write!(f, "content_filter"),
        }
    }
}

/// Token usage for a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The upstream vendor that serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Google,
    Mistral,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Google,
        ProviderKind::Mistral,
    ];

    /// Resolve the provider from a model name prefix.
    pub fn for_model(model: &str) -> Option<Self> {
        if model.starts_with("gpt-") {
            Some(ProviderKind::OpenAi)
        } else if model.starts_with("claude-") {
            Some(ProviderKind::Anthropic)
        } else if model.starts_with("gemini-") {
            Some(ProviderKind::Google)
        } else if model.starts_with("mistral-") {
            Some(ProviderKind::Mistral)
        } else {
            None
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Google => "GOOGLE_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Mistral => write!(f, "mistral"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" | "gemini" => Ok(ProviderKind::Google),
            "mistral" => Ok(ProviderKind::Mistral),
            other => Err(format!("invalid provider: '{other}'")),
        }
    }
}

/// Models accepted by the chat endpoint.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-3.5-turbo",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "mistral-large-latest",
    "mistral-small-latest",
];

pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0} provider is not configured (missing API key)")]
    NotConfigured(ProviderKind),

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_model_prefix() {
        assert_eq!(ProviderKind::for_model("gpt-4o"), Some(ProviderKind::OpenAi));
        assert_eq!(
            ProviderKind::for_model("claude-3-opus-20240229"),
            Some(ProviderKind::Anthropic)
        );
        assert_eq!(ProviderKind::for_model("gemini-1.5-pro"), Some(ProviderKind::Google));
        assert_eq!(
            ProviderKind::for_model("mistral-small-latest"),
            Some(ProviderKind::Mistral)
        );
        assert_eq!(ProviderKind::for_model("llama-3"), None);
    }

    #[test]
    fn test_every_supported_model_has_provider() {
        for model in SUPPORTED_MODELS {
            assert!(
                ProviderKind::for_model(model).is_some(),
                "no provider for {model}"
            );
        }
    }

    #[test]
    fn test_is_supported_model() {
        assert!(is_supported_model("gpt-4o"));
        assert!(!is_supported_model("gpt-5-ultra"));
        assert!(!is_supported_model(""));
    }

    #[test]
    fn test_provider_kind_roundtrip() {
        for kind in ProviderKind::ALL {
            let parsed: ProviderKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::NotConfigured(ProviderKind::Mistral);
        assert_eq!(
            err.to_string(),
            "mistral provider is not configured (missing API key)"
        );
    }
}
