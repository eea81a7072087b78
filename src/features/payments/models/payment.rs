use rust_decimal::Decimal;

use crate::features::payments::PaymentError;

/// External payment vendors the bot knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentProvider {
    Stripe,
    PayPal,
    /// Reserved; no gateway exists for it yet
    Crypto,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::PayPal => "paypal",
            PaymentProvider::Crypto => "crypto",
        }
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stripe" => Ok(PaymentProvider::Stripe),
            "paypal" => Ok(PaymentProvider::PayPal),
            "crypto" => Ok(PaymentProvider::Crypto),
            other => Err(PaymentError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-item checkout to open with a vendor
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    /// Upper-case ISO-4217 code
    pub currency: String,
    pub description: String,
    /// Sent to the vendor so a retried request does not open a second session
    pub idempotency_key: String,
}

/// A vendor session the user can be redirected to
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRef {
    /// Vendor session or payment id, stored as the transaction's provider reference
    pub id: String,
    pub redirect_url: String,
    pub provider: PaymentProvider,
    /// Vendor response body, kept with the transaction
    pub payload: serde_json::Value,
}
