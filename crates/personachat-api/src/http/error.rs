//! Application error type mapping to HTTP status codes and the error envelope.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use personachat_core::ratelimit::RateLimitDecision;
use personachat_types::error::{ChatError, PersonaError};

use super::ratelimit::insert_rate_limit_headers;
use super::response::ApiResponse;

/// Generic 500 text for the chat endpoint.
pub const CHAT_INTERNAL_ERROR: &str = "Internal server error. Please try again later.";
/// Generic 500 text everywhere else.
pub const INTERNAL_ERROR: &str = "Internal server error";
pub const RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// 400 with a user-facing message.
    Validation(String),
    /// 404.
    NotFound(String),
    /// 409.
    Conflict(String),
    /// 403.
    Forbidden(String),
    /// 429; carries the decision so the response can advertise the window.
    RateLimited(RateLimitDecision),
    /// 503.
    Unavailable(String),
    /// 500. `detail` is only sent to the client in development.
    Internal {
        public: &'static str,
        detail: Option<String>,
    },
}

impl AppError {
    /// A 500 that logs `cause` and exposes it only when `expose` is set.
    pub fn internal(public: &'static str, cause: impl std::fmt::Display, expose: bool) -> Self {
        let cause = cause.to_string();
        error!(error = %cause, "{public}");
        AppError::Internal {
            public,
            detail: expose.then_some(cause),
        }
    }

    /// Map a persona service error. `expose` controls internal detail.
    pub fn from_persona(e: PersonaError, expose: bool) -> Self {
        match e {
            PersonaError::NotFound(_) => AppError::NotFound(e.to_string()),
            PersonaError::Conflict(_) => AppError::Conflict(e.to_string()),
            PersonaError::DefaultImmutable(_) => AppError::Forbidden(e.to_string()),
            PersonaError::Validation(msg) => AppError::Validation(msg),
            PersonaError::Storage(_) => AppError::internal(INTERNAL_ERROR, e, expose),
        }
    }

    /// Map a chat service error raised while serving `POST /chat`.
    pub fn from_chat_turn(e: ChatError, expose: bool) -> Self {
        match e {
            ChatError::Validation(msg) => AppError::Validation(msg),
            ChatError::PersonaNotFound(_) | ChatError::SessionNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            ChatError::Llm(_) | ChatError::Storage(_) => {
                AppError::internal(CHAT_INTERNAL_ERROR, e, expose)
            }
        }
    }

    /// Map a chat service error on the history and session endpoints.
    pub fn from_chat(e: ChatError, expose: bool) -> Self {
        match e {
            ChatError::Validation(msg) => AppError::Validation(msg),
            ChatError::PersonaNotFound(_) | ChatError::SessionNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            ChatError::Llm(_) | ChatError::Storage(_) => {
                AppError::internal(INTERNAL_ERROR, e, expose)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg)
            | AppError::Unavailable(msg) => ApiResponse::error(msg.clone()),
            AppError::RateLimited(_) => ApiResponse::error(RATE_LIMITED),
            AppError::Internal { public, detail } => {
                let body = ApiResponse::error(*public);
                match detail {
                    Some(detail) => body.with_message(detail.clone()),
                    None => body,
                }
            }
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::RateLimited(decision) = &self {
            let headers = response.headers_mut();
            insert_rate_limit_headers(headers, decision);
            if let Ok(value) = HeaderValue::from_str(&decision.retry_after_secs.to_string()) {
                headers.insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_types::llm::{LlmError, ProviderKind};

    #[test]
    fn test_persona_error_statuses() {
        let cases = [
            (PersonaError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PersonaError::Conflict("x".into()), StatusCode::CONFLICT),
            (PersonaError::DefaultImmutable("delete"), StatusCode::FORBIDDEN),
            (PersonaError::Validation("Name is required".into()), StatusCode::BAD_REQUEST),
            (PersonaError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from_persona(err, false).status(), status);
        }
    }

    #[test]
    fn test_chat_turn_llm_error_is_generic_500() {
        let err = AppError::from_chat_turn(
            ChatError::Llm(LlmError::NotConfigured(ProviderKind::Anthropic)),
            false,
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            err,
            AppError::Internal { public: CHAT_INTERNAL_ERROR, detail: None }
        ));
    }

    #[test]
    fn test_internal_detail_only_when_exposed() {
        let err = AppError::from_chat(ChatError::Storage("locked".into()), true);
        assert!(matches!(err, AppError::Internal { detail: Some(ref d), .. } if d.contains("locked")));
    }
}
