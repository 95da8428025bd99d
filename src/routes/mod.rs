// src/routes/mod.rs
pub mod chat;
pub mod health;

use crate::config::{AllowedMethods, CorsConfig};
use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use chat::chat_handler;
use health::health_handler;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(cors: &CorsConfig) -> Router<SharedState> {
    Router::new()
        .route("/", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}

/// Credentials are allowed, so "all headers" and "all methods" are mirrored
/// from the preflight request instead of answered with `*`.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods = match &config.allowed_methods {
        AllowedMethods::Any => AllowMethods::mirror_request(),
        AllowedMethods::List(list) => AllowMethods::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.iter().cloned()))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
