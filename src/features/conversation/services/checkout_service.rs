use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::core::metrics::Metrics;
use crate::features::conversation::models::ServiceOption;
use crate::features::payments::{PaymentOrchestrator, PaymentProvider, PaymentRef};
use crate::features::transactions::{NewTransaction, Transaction, TransactionStore};

/// An opened vendor session and the transaction recording it
#[derive(Debug, Clone)]
pub struct Checkout {
    pub payment: PaymentRef,
    pub transaction: Transaction,
}

/// Opens a payment for a catalog service and records it as a transaction
pub struct CheckoutService {
    payments: Arc<PaymentOrchestrator>,
    transactions: Arc<dyn TransactionStore>,
    metrics: Arc<Metrics>,
    provider: PaymentProvider,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        payments: Arc<PaymentOrchestrator>,
        transactions: Arc<dyn TransactionStore>,
        metrics: Arc<Metrics>,
        provider: PaymentProvider,
        currency: String,
    ) -> Self {
        Self {
            payments,
            transactions,
            metrics,
            provider,
            currency,
        }
    }

    /// Create the vendor session first; a transaction exists only once the
    /// vendor has accepted. Payment failures surface as `AppError::Payment`.
    pub async fn checkout(&self, identity: i64, option: &ServiceOption) -> Result<Checkout> {
        // Fresh key per selection: a repeated tap opens a second session
        let idempotency_key = Uuid::new_v4().to_string();

        let payment = match self
            .payments
            .create_payment(
                option.price(),
                &self.currency,
                self.provider,
                &option.description(),
                &idempotency_key,
            )
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                self.metrics.record_payment(self.provider.as_str(), "failed");
                return Err(e.into());
            }
        };

        let transaction = self
            .transactions
            .create(NewTransaction {
                user_identity: identity,
                amount: option.price(),
                currency: self.currency.clone(),
                provider: payment.provider,
                provider_reference: payment.id.clone(),
                payload: payment.payload.clone(),
            })
            .await?;

        self.metrics.record_payment(payment.provider.as_str(), "created");

        Ok(Checkout {
            payment,
            transaction,
        })
    }
}
