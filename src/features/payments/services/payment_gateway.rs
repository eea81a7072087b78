use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::features::payments::models::{PaymentProvider, PaymentRef, PaymentRequest, WebhookOutcome};
use crate::features::payments::PaymentError;

/// One payment vendor: opens checkout sessions and authenticates its callbacks
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    async fn create_session(&self, request: &PaymentRequest) -> Result<PaymentRef, PaymentError>;

    /// Authenticate a raw webhook delivery and map it to a status change.
    ///
    /// Returns `PaymentError::Signature` when the delivery is not authentic.
    async fn verify_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError>;
}
