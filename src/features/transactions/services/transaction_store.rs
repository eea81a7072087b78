use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::payments::PaymentProvider;
use crate::features::transactions::models::{
    NewTransaction, Transaction, TransactionRow, TransactionStatus,
};

/// Persistence port for payment transactions
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, new: NewTransaction) -> Result<Transaction>;

    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Transaction>>;

    /// Move a transaction to `status` and record the event that caused it.
    ///
    /// Returns `None` when the stored transaction is already terminal; a
    /// terminal status is never overwritten.
    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        event: serde_json::Value,
    ) -> Result<Option<Transaction>>;
}

const TRANSACTION_COLUMNS: &str = "id, user_identity, amount, currency, provider, status, \
     provider_reference, payload, created_at, updated_at";

/// Postgres-backed transaction store
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        let id = Uuid::now_v7();
        let query = format!(
            r#"
            INSERT INTO transactions
                (id, user_identity, amount, currency, provider, status,
                 provider_reference, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .bind(new.user_identity)
            .bind(new.amount)
            .bind(&new.currency)
            .bind(new.provider.as_str())
            .bind(TransactionStatus::Created.as_str())
            .bind(&new.provider_reference)
            .bind(&new.payload)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create transaction for user {} ({} {}): {:?}",
                    new.user_identity,
                    new.provider,
                    new.provider_reference,
                    e
                );
                AppError::Database(e)
            })?;

        tracing::info!(
            "Created transaction {} for user {} via {}",
            id,
            new.user_identity,
            new.provider
        );

        row.try_into()
    }

    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        let query = format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE provider = $1 AND provider_reference = $2
            "#,
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(provider.as_str())
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to find {} transaction {}: {:?}",
                    provider,
                    reference,
                    e
                );
                AppError::Database(e)
            })?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        event: serde_json::Value,
    ) -> Result<Option<Transaction>> {
        // The status guard makes concurrent webhook deliveries safe
        let query = format!(
            r#"
            UPDATE transactions
            SET status = $2,
                payload = payload || jsonb_build_object('last_event', $3::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('succeeded', 'failed')
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(&event)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update transaction {} to {}: {:?}", id, status, e);
                AppError::Database(e)
            })?;

        row.map(TryInto::try_into).transpose()
    }
}
