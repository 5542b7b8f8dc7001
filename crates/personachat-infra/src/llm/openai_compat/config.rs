//! Per-vendor defaults for providers speaking the OpenAI chat completions
//! protocol.

use std::time::Duration;

use secrecy::SecretString;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name reported in logs and message metadata.
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Upper bound on a single completion call.
    pub timeout: Duration,
}

pub fn openai_defaults(api_key: SecretString, timeout: Duration) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        timeout,
    }
}

/// Google Gemini through its OpenAI-compatible beta endpoint.
pub fn gemini_defaults(api_key: SecretString, timeout: Duration) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "google".into(),
        base_url: GEMINI_BASE_URL.into(),
        api_key,
        timeout,
    }
}

pub fn mistral_defaults(api_key: SecretString, timeout: Duration) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "mistral".into(),
        base_url: MISTRAL_BASE_URL.into(),
        api_key,
        timeout,
    }
}
