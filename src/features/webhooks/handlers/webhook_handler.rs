use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::core::error::Result;
use crate::features::webhooks::services::WebhookService;
use crate::shared::types::ApiResponse;

/// Receive a payment vendor callback
pub async fn receive_webhook(
    State(service): State<Arc<WebhookService>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse>> {
    let reconciliation = service.receive(&provider, &headers, &body).await?;
    tracing::debug!("Webhook from {} handled: {:?}", provider, reconciliation);

    Ok(Json(ApiResponse::success(None)))
}
