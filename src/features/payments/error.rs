/// Failures of payment session creation and webhook verification
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("Unsupported payment provider: {0}")]
    UnsupportedProvider(String),

    #[error("Payment vendor error: {0}")]
    Vendor(String),

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    #[error("Webhook signature rejected: {0}")]
    Signature(String),

    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),
}
