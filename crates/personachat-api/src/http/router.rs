//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`; `/health` is also served at the root.
//! Middleware: CORS, tracing, and rate limiting on the `/api` routes.

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::ratelimit::rate_limit;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat
        .route("/chat", post(handlers::chat::send_message))
        .route(
            "/chat/history/{persona_id}",
            get(handlers::chat::get_history).delete(handlers::chat::clear_history),
        )
        .route("/chat/sessions", get(handlers::chat::list_sessions))
        .route("/chat/sessions/{id}", put(handlers::chat::update_session))
        .route(
            "/chat/sessions/{id}/messages",
            get(handlers::chat::get_session_messages),
        )
        // Personas
        .route("/personas", get(handlers::persona::list_personas))
        .route("/personas", post(handlers::persona::create_persona))
        .route("/personas/{id}", put(handlers::persona::update_persona))
        .route("/personas/{id}", delete(handlers::persona::delete_persona))
        // Health
        .route("/health", get(handlers::health::health_check))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
