mod payment;
mod webhook;

pub use payment::{PaymentProvider, PaymentRef, PaymentRequest};
pub use webhook::{WebhookEvent, WebhookOutcome};
