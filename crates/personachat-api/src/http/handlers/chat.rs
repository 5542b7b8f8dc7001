//! Chat handlers: send a message, read and clear history, manage sessions.

use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use personachat_core::chat::validation::{normalize_user_id, validate_send_message};
use personachat_types::chat::{
    ChatSession, HistoryMessage, SendMessageRequest, SendMessageResponse, UpdateSessionRequest,
};

use crate::http::error::AppError;
use crate::http::extractors::json::JsonBody;
use crate::http::extractors::params::{PathParam, QueryParams};
use crate::http::extractors::query::{HistoryQuery, SessionsQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/chat - Run one chat turn against the persona.
pub async fn send_message(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> Result<Json<ApiResponse<SendMessageResponse>>, AppError> {
    let chat = validate_send_message(body, state.chat_service.config())
        .map_err(AppError::Validation)?;

    tracing::info!(
        persona_id = %chat.persona_id,
        model = %chat.model,
        chars = chat.message.chars().count(),
        "Chat request"
    );

    let reply = state
        .chat_service
        .send_message(chat)
        .await
        .map_err(|e| AppError::from_chat_turn(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(reply)))
}

/// GET /api/chat/history/{personaId}
pub async fn get_history(
    State(state): State<AppState>,
    PathParam(persona_id): PathParam<String>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryMessage>>>, AppError> {
    let history = state
        .chat_service
        .get_chat_history(&persona_id, query.user_id())
        .await
        .map_err(|e| AppError::from_chat(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(history)))
}

/// DELETE /api/chat/history/{personaId}
pub async fn clear_history(
    State(state): State<AppState>,
    PathParam(persona_id): PathParam<String>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .chat_service
        .clear_chat_history(&persona_id, query.user_id())
        .await
        .map_err(|e| AppError::from_chat(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::ok_message("Chat history cleared successfully")))
}

/// GET /api/chat/sessions?userId= - Sessions of one user, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SessionsQuery>,
) -> Result<Json<ApiResponse<Vec<ChatSession>>>, AppError> {
    let user_id = normalize_user_id(query.user_id.as_deref())
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let sessions = state
        .chat_service
        .list_user_sessions(user_id)
        .await
        .map_err(|e| AppError::from_chat(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(sessions)))
}

/// GET /api/chat/sessions/{id}/messages
pub async fn get_session_messages(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<ApiResponse<Vec<HistoryMessage>>>, AppError> {
    let session_id = parse_session_id(&id)?;

    let messages = state
        .chat_service
        .get_session_messages(&session_id)
        .await
        .map_err(|e| AppError::from_chat(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(messages)))
}

/// PUT /api/chat/sessions/{id} - Rename a session.
pub async fn update_session(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<UpdateSessionRequest>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let session_id = parse_session_id(&id)?;
    let title = body.title.unwrap_or_default();

    let session = state
        .chat_service
        .update_session_title(&session_id, &title)
        .await
        .map_err(|e| AppError::from_chat(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(session)))
}

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid session id: {raw}")))
}
