//! Model-name based dispatch across configured providers.
//!
//! Each [`ProviderKind`] maps to at most one provider client. A provider is
//! only registered when its API key is present, so asking for a model whose
//! vendor has no key fails with [`LlmError::NotConfigured`] rather than an
//! upstream authentication error.

use std::collections::HashMap;
use std::time::Instant;

use personachat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, LlmMessage, ProviderKind,
};
use personachat_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use tracing::{Instrument, debug, info_span, warn};

use super::box_provider::BoxLlmProvider;

/// Result of a dispatched completion.
#[derive(Debug, Clone)]
pub struct DispatchedReply {
    pub provider: ProviderKind,
    pub response: CompletionResponse,
    pub elapsed_ms: u64,
}

/// Routes completion requests to the provider that serves the requested model.
#[derive(Debug)]
pub struct LlmDispatcher {
    providers: HashMap<ProviderKind, BoxLlmProvider>,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl LlmDispatcher {
    pub fn new(max_tokens: u32, temperature: Option<f64>) -> Self {
        Self {
            providers: HashMap::new(),
            max_tokens,
            temperature,
        }
    }

    /// Register (or replace) the client for a provider.
    pub fn register(&mut self, kind: ProviderKind, provider: BoxLlmProvider) {
        debug!(provider = %kind, client = provider.name(), "Registered LLM provider");
        self.providers.insert(kind, provider);
    }

    pub fn with_provider(mut self, kind: ProviderKind, provider: BoxLlmProvider) -> Self {
        self.register(kind, provider);
        self
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Configured providers in a stable order.
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.providers.contains_key(k))
            .collect()
    }

    /// Build the provider-neutral request for a persona turn.
    pub fn build_request(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<LlmMessage>,
    ) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages,
            system: Some(system_prompt.to_string()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Send the conversation to whichever provider serves `model`.
    pub async fn reply(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<LlmMessage>,
    ) -> Result<DispatchedReply, LlmError> {
        let kind = ProviderKind::for_model(model)
            .ok_or_else(|| LlmError::UnsupportedModel(model.to_string()))?;
        let provider = self
            .providers
            .get(&kind)
            .ok_or(LlmError::NotConfigured(kind))?;

        let request = self.build_request(model, system_prompt, messages);

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %kind,
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
        );

        let started = Instant::now();
        let result = provider.complete(&request).instrument(span.clone()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %kind, model, error = %e, elapsed_ms, "LLM call failed");
                return Err(e);
            }
        };

        span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
        span.record(
            GEN_AI_RESPONSE_FINISH_REASONS,
            tracing::field::display(response.stop_reason),
        );

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(DispatchedReply {
            provider: kind,
            response,
            elapsed_ms,
        })
    }
}
