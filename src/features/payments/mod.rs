pub mod clients;
mod error;
pub mod models;
pub mod services;

pub use clients::{http_client, PayPalGateway, StripeGateway};
pub use error::PaymentError;
pub use models::{PaymentProvider, PaymentRef, PaymentRequest, WebhookEvent, WebhookOutcome};
pub use services::{PaymentGateway, PaymentOrchestrator};
