use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

use crate::core::config::{PaymentsConfig, StripeConfig};
use crate::features::payments::models::{
    PaymentProvider, PaymentRef, PaymentRequest, WebhookEvent, WebhookOutcome,
};
use crate::features::payments::services::PaymentGateway;
use crate::features::payments::PaymentError;
use crate::features::transactions::TransactionStatus;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com";
const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
}

/// Stripe Checkout gateway
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    webhook_tolerance_secs: i64,
    success_url: String,
    cancel_url: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, config: &StripeConfig, payments: &PaymentsConfig) -> Self {
        Self {
            client,
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
            success_url: payments.success_url.clone(),
            cancel_url: payments.cancel_url.clone(),
        }
    }
}

/// Amount in the currency's minor unit (cents)
pub fn minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp(0)
        .to_i64()
        .filter(|units| *units > 0)
        .ok_or_else(|| PaymentError::InvalidRequest(format!("Unusable amount {}", amount)))
}

/// Check a `Stripe-Signature` header against the raw request body.
///
/// The signed payload is `"{t}.{body}"`; any `v1` entry may match. Timestamps
/// further than `tolerance_secs` from `now` are rejected.
pub fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::Signature("Missing timestamp".to_string()))?;
    let issued_at = timestamp
        .parse::<i64>()
        .map_err(|_| PaymentError::Signature(format!("Invalid timestamp '{}'", timestamp)))?;

    if signatures.is_empty() {
        return Err(PaymentError::Signature("No v1 signature".to_string()));
    }

    if (now - issued_at).abs() > tolerance_secs {
        return Err(PaymentError::Signature(format!(
            "Timestamp {} outside tolerance of {}s",
            issued_at, tolerance_secs
        )));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Signature(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    // verify_slice compares in constant time
    let matched = signatures.iter().any(|signature| {
        hex::decode(signature)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::Signature("No matching v1 signature".to_string()))
    }
}

/// Map a Stripe event to the transaction status it implies
pub fn map_event(event: &serde_json::Value) -> Result<WebhookOutcome, PaymentError> {
    let event_type = event["type"]
        .as_str()
        .ok_or_else(|| PaymentError::MalformedEvent("Missing event type".to_string()))?
        .to_string();
    let object = &event["data"]["object"];

    let status = match event_type.as_str() {
        "checkout.session.completed" => match object["payment_status"].as_str() {
            Some("paid") | Some("no_payment_required") => TransactionStatus::Succeeded,
            // Delayed methods settle through the async_payment events
            _ => TransactionStatus::Pending,
        },
        "checkout.session.async_payment_succeeded" => TransactionStatus::Succeeded,
        "checkout.session.async_payment_failed" | "checkout.session.expired" => {
            TransactionStatus::Failed
        }
        _ => return Ok(WebhookOutcome::Ignored { event_type }),
    };

    let provider_reference = object["id"]
        .as_str()
        .ok_or_else(|| {
            PaymentError::MalformedEvent(format!("{} without a session id", event_type))
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
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }

    async fn create_session(&self, request: &PaymentRequest) -> Result<PaymentRef, PaymentError> {
        let unit_amount = minor_units(request.amount)?.to_string();
        let currency = request.currency.to_lowercase();

        let form = [
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", currency.as_str()),
            ("line_items[0][price_data][unit_amount]", unit_amount.as_str()),
            (
                "line_items[0][price_data][product_data][name]",
                request.description.as_str(),
            ),
            ("success_url", self.success_url.as_str()),
            ("cancel_url", self.cancel_url.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", STRIPE_API_BASE))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Vendor(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Vendor(format!("Unreadable Stripe response: {}", e)))?;

        if !status.is_success() {
            let message = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(PaymentError::Vendor(format!(
                "Stripe returned HTTP {}: {}",
                status, message
            )));
        }

        let session: CheckoutSession = serde_json::from_value(payload.clone())
            .map_err(|e| PaymentError::Vendor(format!("Unexpected Stripe session: {}", e)))?;
        let redirect_url = session
            .url
            .ok_or_else(|| PaymentError::Vendor(format!("Session {} has no url", session.id)))?;

        Ok(PaymentRef {
            id: session.id,
            redirect_url,
            provider: PaymentProvider::Stripe,
            payload,
        })
    }

    async fn verify_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError> {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| PaymentError::Signature("Missing Stripe-Signature header".to_string()))?;

        verify_signature(
            header,
            body,
            &self.webhook_secret,
            self.webhook_tolerance_secs,
            Utc::now().timestamp(),
        )?;

        let event: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::MalformedEvent(format!("Invalid JSON: {}", e)))?;

        map_event(&event)
    }
}

/// `Stripe-Signature` value for `body` signed at `timestamp`
#[cfg(test)]
pub fn sign(body: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
