//! Route table

use crate::config::AppState;
use crate::handlers;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/participants",
            get(handlers::list_participants).post(handlers::register_participant),
        )
        .route(
            "/messages",
            get(handlers::get_messages).post(handlers::post_message),
        )
        .route("/messages/{id}", delete(handlers::delete_message))
        .route("/status", post(handlers::heartbeat))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
