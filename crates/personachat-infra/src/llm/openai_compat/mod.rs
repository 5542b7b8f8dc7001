//! OpenAI-compatible LLM provider.
//!
//! One [`OpenAiCompatibleProvider`] serves OpenAI, Google Gemini and Mistral
//! via per-vendor base URLs. Uses [`async_openai`] for the request/response
//! types and transport.

pub mod config;

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, FinishReason,
};
use secrecy::ExposeSecret;

use personachat_core::llm::provider::LlmProvider;
use personachat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use self::config::OpenAiCompatConfig;

/// Provider for any OpenAI-compatible chat completions API.
///
/// Does not derive `Debug`; the inner client holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            timeout: config.timeout,
        }
    }

    pub fn openai(api_key: secrecy::SecretString, timeout: Duration) -> Self {
        Self::new(config::openai_defaults(api_key, timeout))
    }

    pub fn gemini(api_key: secrecy::SecretString, timeout: Duration) -> Self {
        Self::new(config::gemini_defaults(api_key, timeout))
    }

    pub fn mistral(api_key: secrecy::SecretString, timeout: Duration) -> Self {
        Self::new(config::mistral_defaults(api_key, timeout))
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    /// The system prompt goes first, followed by the conversation.
    fn build_request(request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref system) = request.system {
            messages.push(system_message(system));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => system_message(&msg.content),
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            };
            messages.push(oai_msg);
        }

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content.to_string()),
        name: None,
    })
}

fn map_finish_reason(reason: Option<&FinishReason>) -> StopReason {
    match reason {
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(FinishReason::ContentFilter) => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

fn into_completion(response: CreateChatCompletionResponse) -> CompletionResponse {
    let first = response.choices.first();
    let content = first
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();
    let stop_reason = map_finish_reason(first.and_then(|c| c.finish_reason.as_ref()));

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    CompletionResponse {
        id: response.id,
        content,
        model: response.model,
        stop_reason,
        usage,
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = Self::build_request(request);

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(oai_request))
            .await
            .map_err(|_| LlmError::Provider {
                message: format!(
                    "{} request timed out after {}s",
                    self.provider_name,
                    self.timeout.as_secs()
                ),
            })?
            .map_err(map_openai_error)?;

        Ok(into_completion(response))
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(503) | Some(529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_types::llm::LlmMessage;
    use secrecy::SecretString;

    fn request(system: Option<&str>, messages: Vec<LlmMessage>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_string(),
            messages,
            system: system.map(str::to_string),
            max_tokens: 1000,
            temperature: Some(0.7),
        }
    }

    #[test]
    fn test_factory_names() {
        let t = Duration::from_secs(60);
        assert_eq!(OpenAiCompatibleProvider::openai(SecretString::from("k"), t).name(), "openai");
        assert_eq!(OpenAiCompatibleProvider::gemini(SecretString::from("k"), t).name(), "google");
        assert_eq!(OpenAiCompatibleProvider::mistral(SecretString::from("k"), t).name(), "mistral");
    }

    #[test]
    fn test_build_request_puts_system_first() {
        let req = OpenAiCompatibleProvider::build_request(&request(
            Some("You are Grandma."),
            vec![LlmMessage::user("Hi"), LlmMessage::assistant("Hello dear")],
        ));

        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.messages.len(), 3);
        assert!(matches!(req.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(req.messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(req.messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert_eq!(req.max_completion_tokens, Some(1000));
        assert_eq!(req.temperature, Some(0.7));
    }

    #[test]
    fn test_build_request_without_system() {
        let req = OpenAiCompatibleProvider::build_request(&request(None, vec![LlmMessage::user("Hi")]));
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some(&FinishReason::Stop)), StopReason::EndTurn);
        assert_eq!(map_finish_reason(Some(&FinishReason::Length)), StopReason::MaxTokens);
        assert_eq!(
            map_finish_reason(Some(&FinishReason::ContentFilter)),
            StopReason::ContentFilter
        );
        assert_eq!(map_finish_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit reached".to_string(),
            r#type: Some("requests".to_string()),
            param: None,
            code: Some("rate_limit_exceeded".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
