//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement.

use personachat_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Anthropic, OpenAI-compatible, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Wrap in
/// [`BoxLlmProvider`](super::box_provider::BoxLlmProvider) for runtime selection.
///
/// Implementations live in personachat-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
