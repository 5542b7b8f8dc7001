//! Persona CRUD handlers for the REST API.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use personachat_types::persona::{CreatePersonaRequest, Persona, UpdatePersonaRequest};

use crate::http::error::AppError;
use crate::http::extractors::json::JsonBody;
use crate::http::extractors::params::PathParam;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/personas - Built-in personas first, then custom ones by creation time.
pub async fn list_personas(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Persona>>>, AppError> {
    let personas = state
        .persona_service
        .list_personas()
        .await
        .map_err(|e| AppError::from_persona(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(personas)))
}

/// POST /api/personas - Create a custom persona.
pub async fn create_persona(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreatePersonaRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Persona>>), AppError> {
    let persona = state
        .persona_service
        .create_persona(body)
        .await
        .map_err(|e| AppError::from_persona(e, state.expose_errors()))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(persona))))
}

/// PUT /api/personas/{id} - Update a custom persona.
pub async fn update_persona(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<UpdatePersonaRequest>,
) -> Result<Json<ApiResponse<Persona>>, AppError> {
    let persona = state
        .persona_service
        .update_persona(&id, body)
        .await
        .map_err(|e| AppError::from_persona(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::success(persona)))
}

/// DELETE /api/personas/{id} - Delete a custom persona and its chats.
pub async fn delete_persona(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .persona_service
        .delete_persona(&id)
        .await
        .map_err(|e| AppError::from_persona(e, state.expose_errors()))?;

    Ok(Json(ApiResponse::ok_message("Persona deleted successfully")))
}
