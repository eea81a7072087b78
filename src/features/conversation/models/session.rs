use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    SelectingService,
    AwaitingPayment,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::SelectingService => "selecting_service",
            ConversationState::AwaitingPayment => "awaiting_payment",
        }
    }
}

impl std::str::FromStr for ConversationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(ConversationState::Idle),
            "selecting_service" => Ok(ConversationState::SelectingService),
            "awaiting_payment" => Ok(ConversationState::AwaitingPayment),
            other => Err(AppError::Internal(format!(
                "Unknown conversation state '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// English name of the selected service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Transaction awaiting vendor confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
}

/// Per-identity dialogue position, loaded and saved around every update
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSession {
    pub identity: i64,
    pub state: ConversationState,
    pub context: SessionContext,
}

impl ConversationSession {
    pub fn idle(identity: i64) -> Self {
        Self {
            identity,
            state: ConversationState::Idle,
            context: SessionContext::default(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ConversationState::Idle;
        self.context = SessionContext::default();
    }

    /// Whether this session is waiting on `transaction_id`
    pub fn awaits(&self, transaction_id: Uuid) -> bool {
        self.state == ConversationState::AwaitingPayment
            && self.context.transaction_id == Some(transaction_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ConversationSessionRow {
    pub identity: i64,
    pub state: String,
    pub context: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationSessionRow> for ConversationSession {
    type Error = AppError;

    fn try_from(row: ConversationSessionRow) -> Result<Self, Self::Error> {
        let context = serde_json::from_value(row.context).unwrap_or_else(|e| {
            tracing::warn!(
                "Discarding unreadable session context for {}: {}",
                row.identity,
                e
            );
            SessionContext::default()
        });

        Ok(Self {
            identity: row.identity,
            state: row.state.parse()?,
            context,
        })
    }
}
