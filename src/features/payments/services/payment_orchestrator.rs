use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::features::payments::models::{PaymentProvider, PaymentRef, PaymentRequest};
use crate::features::payments::services::PaymentGateway;
use crate::features::payments::PaymentError;

/// Routes payment requests to the gateway registered for each provider
#[derive(Default)]
pub struct PaymentOrchestrator {
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
}

impl PaymentOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        tracing::info!("Registered payment gateway {}", gateway.provider());
        self.gateways.insert(gateway.provider(), gateway);
        self
    }

    pub fn gateway(&self, provider: PaymentProvider) -> Result<Arc<dyn PaymentGateway>, PaymentError> {
        self.gateways
            .get(&provider)
            .cloned()
            .ok_or_else(|| PaymentError::UnsupportedProvider(provider.to_string()))
    }

    /// Open a checkout session with `provider`.
    ///
    /// No vendor is contacted when the provider has no gateway. Vendor errors
    /// are not retried.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        currency: &str,
        provider: PaymentProvider,
        description: &str,
        idempotency_key: &str,
    ) -> Result<PaymentRef, PaymentError> {
        let gateway = self.gateway(provider).map_err(|e| {
            tracing::warn!("Payment requested for provider without gateway: {}", provider);
            e
        })?;

        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidRequest(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }

        let request = PaymentRequest {
            amount,
            currency: currency.to_uppercase(),
            description: description.to_string(),
            idempotency_key: idempotency_key.to_string(),
        };

        match gateway.create_session(&request).await {
            Ok(payment) => {
                tracing::info!(
                    "Created {} payment session {} for {} {}",
                    provider,
                    payment.id,
                    request.amount,
                    request.currency
                );
                Ok(payment)
            }
            Err(e) => {
                tracing::error!("Failed to create {} payment session: {}", provider, e);
                Err(e)
            }
        }
    }
}
