use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::post, Router};

use crate::core::middleware::{source_rate_limit_middleware, SourceRateLimit};
use crate::features::webhooks::handlers;
use crate::features::webhooks::services::WebhookService;

/// Create routes for vendor webhooks, limited per source address
pub fn routes(service: Arc<WebhookService>, limit: SourceRateLimit) -> Router {
    Router::new()
        .route("/webhook/{provider}", post(handlers::receive_webhook))
        .route_layer(from_fn_with_state(limit, source_rate_limit_middleware))
        .with_state(service)
}
