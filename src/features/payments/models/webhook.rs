use crate::features::transactions::TransactionStatus;

/// A verified vendor callback normalized to a transaction status change
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_type: String,
    /// Matches `Transaction::provider_reference`
    pub provider_reference: String,
    pub status: TransactionStatus,
    pub payload: serde_json::Value,
}

/// Result of verifying and interpreting a webhook body
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Event(WebhookEvent),
    /// Authentic, but of a type that does not affect transactions
    Ignored { event_type: String },
}
