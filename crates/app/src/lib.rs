//! Medrelay application composition root
//!
//! Composes the domain routers and shared infrastructure routes into a single
//! application.

use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use medrelay_conversations::{
    api::middleware::SharedRelay, ConversationsRepositories, ConversationsState,
};
use medrelay_relay::{RelayConfig, RelayServiceFactory};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all routes
pub fn create_app(pool: PgPool, relay_config: RelayConfig) -> Result<Router, anyhow::Error> {
    let relay = RelayServiceFactory::create(relay_config)?;

    tracing::info!(mode = %relay.mode(), "Answer service relay ready");

    Ok(build_router(
        ConversationsRepositories::new(pool),
        Arc::from(relay),
    ))
}

/// Compose routes around an already-built relay
pub fn build_router(repos: ConversationsRepositories, relay: SharedRelay) -> Router {
    let conversations_state = ConversationsState { repos, relay };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Medrelay API v0.0.1-SNAPSHOT" }),
        )
        .merge(medrelay_conversations::routes().with_state(conversations_state))
}

/// CORS layer for a comma-separated origin list; `*` allows any origin
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Reject request bodies larger than 1 MiB
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
