use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::{PayPalConfig, PaymentsConfig};
use crate::features::payments::clients::PayPalTokenManager;
use crate::features::payments::models::{
    PaymentProvider, PaymentRef, PaymentRequest, WebhookEvent, WebhookOutcome,
};
use crate::features::payments::services::PaymentGateway;
use crate::features::payments::PaymentError;
use crate::features::transactions::TransactionStatus;

const TRANSMISSION_HEADERS: [&str; 5] = [
    "paypal-auth-algo",
    "paypal-cert-url",
    "paypal-transmission-id",
    "paypal-transmission-sig",
    "paypal-transmission-time",
];

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPayment {
    id: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    verification_status: String,
}

/// PayPal REST payments gateway
pub struct PayPalGateway {
    client: reqwest::Client,
    tokens: PayPalTokenManager,
    api_base_url: String,
    webhook_id: String,
    success_url: String,
    cancel_url: String,
}

impl PayPalGateway {
    pub fn new(client: reqwest::Client, config: &PayPalConfig, payments: &PaymentsConfig) -> Self {
        let api_base_url = config.mode.api_base_url().to_string();
        Self {
            tokens: PayPalTokenManager::new(
                client.clone(),
                api_base_url.clone(),
                config.client_id.clone(),
                config.client_secret.clone(),
            ),
            client,
            api_base_url,
            webhook_id: config.webhook_id.clone(),
            success_url: payments.success_url.clone(),
            cancel_url: payments.cancel_url.clone(),
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<serde_json::Value, PaymentError> {
        let token = self.tokens.access_token().await?;

        let mut request = self
            .client
            .post(format!("{}{}", self.api_base_url, path))
            .bearer_auth(token)
            .json(body);
        if let Some(request_id) = request_id {
            request = request.header("PayPal-Request-Id", request_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::Vendor(format!("PayPal request to {} failed: {}", path, e)))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Vendor(format!("Unreadable PayPal response: {}", e)))?;

        if !status.is_success() {
            let message = payload["message"].as_str().unwrap_or("unknown error");
            return Err(PaymentError::Vendor(format!(
                "PayPal returned HTTP {} for {}: {}",
                status, path, message
            )));
        }

        Ok(payload)
    }
}

/// Body of a `POST /v1/payments/payment` sale
pub fn payment_body(request: &PaymentRequest, success_url: &str, cancel_url: &str) -> serde_json::Value {
    json!({
        "intent": "sale",
        "payer": { "payment_method": "paypal" },
        "transactions": [{
            "amount": {
                "total": format!("{:.2}", request.amount),
                "currency": request.currency,
            },
            "description": request.description,
        }],
        "redirect_urls": {
            "return_url": success_url,
            "cancel_url": cancel_url,
        },
    })
}

/// Map a PayPal webhook event to the transaction status it implies
pub fn map_event(event: &serde_json::Value) -> Result<WebhookOutcome, PaymentError> {
    let event_type = event["event_type"]
        .as_str()
        .ok_or_else(|| PaymentError::MalformedEvent("Missing event_type".to_string()))?
        .to_string();

    let status = match event_type.as_str() {
        "PAYMENT.SALE.COMPLETED" => TransactionStatus::Succeeded,
        "PAYMENT.SALE.DENIED" => TransactionStatus::Failed,
        "PAYMENT.SALE.PENDING" => TransactionStatus::Pending,
        _ => return Ok(WebhookOutcome::Ignored { event_type }),
    };

    // Sales reference the payment created at checkout
    let provider_reference = event["resource"]["parent_payment"]
        .as_str()
        .ok_or_else(|| {
            PaymentError::MalformedEvent(format!("{} without parent_payment", event_type))
        })?
        .to_string();

    Ok(WebhookOutcome::Event(WebhookEvent {
        event_type,
        provider_reference,
        status,
        payload: event.clone(),
    }))
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::PayPal
    }

    async fn create_session(&self, request: &PaymentRequest) -> Result<PaymentRef, PaymentError> {
        let body = payment_body(request, &self.success_url, &self.cancel_url);
        let payload = self
            .post_json("/v1/payments/payment", &body, Some(&request.idempotency_key))
            .await?;

        let payment: CreatedPayment = serde_json::from_value(payload.clone())
            .map_err(|e| PaymentError::Vendor(format!("Unexpected PayPal payment: {}", e)))?;
        let redirect_url = payment
            .links
            .into_iter()
            .find(|link| link.rel == "approval_url")
            .map(|link| link.href)
            .ok_or_else(|| {
                PaymentError::Vendor(format!("Payment {} has no approval_url", payment.id))
            })?;

        Ok(PaymentRef {
            id: payment.id,
            redirect_url,
            provider: PaymentProvider::PayPal,
            payload,
        })
    }

    async fn verify_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError> {
        let mut transmission = Vec::with_capacity(TRANSMISSION_HEADERS.len());
        for name in TRANSMISSION_HEADERS {
            let value = headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| PaymentError::Signature(format!("Missing {} header", name)))?;
            transmission.push(value);
        }

        let event: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::MalformedEvent(format!("Invalid JSON: {}", e)))?;

        let verification = json!({
            "auth_algo": transmission[0],
            "cert_url": transmission[1],
            "transmission_id": transmission[2],
            "transmission_sig": transmission[3],
            "transmission_time": transmission[4],
            "webhook_id": self.webhook_id,
            "webhook_event": event,
        });

        let payload = self
            .post_json("/v1/notifications/verify-webhook-signature", &verification, None)
            .await?;
        let response: VerificationResponse = serde_json::from_value(payload)
            .map_err(|e| PaymentError::Vendor(format!("Unexpected verification response: {}", e)))?;

        if response.verification_status != "SUCCESS" {
            return Err(PaymentError::Signature(format!(
                "PayPal verification status {}",
                response.verification_status
            )));
        }

        map_event(&event)
    }
}
