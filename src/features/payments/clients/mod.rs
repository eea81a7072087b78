mod paypal;
mod paypal_token_manager;
pub mod stripe;

pub use paypal::PayPalGateway;
pub use paypal_token_manager::PayPalTokenManager;
pub use stripe::StripeGateway;

use std::time::Duration;

use crate::features::payments::PaymentError;

/// Shared HTTP client for vendor APIs, bounded by `timeout`
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, PaymentError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()
        .map_err(|e| PaymentError::Vendor(format!("Failed to build HTTP client: {}", e)))
}
