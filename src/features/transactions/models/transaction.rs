use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::payments::PaymentProvider;

/// Lifecycle of a payment session as seen by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Vendor session exists, the user has not paid yet
    Created,
    /// Vendor reported the payment as in progress
    Pending,
    Succeeded,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Created => "created",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Succeeded => "succeeded",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Succeeded | TransactionStatus::Failed
        )
    }

    /// Terminal states are final; everything else may move forward
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (TransactionStatus::Pending, TransactionStatus::Created) => false,
            (current, next) => *current != next,
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(TransactionStatus::Created),
            "pending" => Ok(TransactionStatus::Pending),
            "succeeded" => Ok(TransactionStatus::Succeeded),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(AppError::Internal(format!(
                "Unknown transaction status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row of the `transactions` table
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_identity: i64,
    pub amount: Decimal,
    pub currency: String,
    pub provider: String,
    pub status: String,
    pub provider_reference: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_identity: i64,
    pub amount: Decimal,
    pub currency: String,
    pub provider: PaymentProvider,
    pub status: TransactionStatus,
    pub provider_reference: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let provider = row.provider.parse::<PaymentProvider>()?;
        let status = row.status.parse::<TransactionStatus>()?;

        Ok(Self {
            id: row.id,
            user_identity: row.user_identity,
            amount: row.amount,
            currency: row.currency,
            provider,
            status,
            provider_reference: row.provider_reference,
            payload: row.payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Data required to record a freshly created vendor session
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_identity: i64,
    pub amount: Decimal,
    pub currency: String,
    pub provider: PaymentProvider,
    pub provider_reference: String,
    pub payload: serde_json::Value,
}
