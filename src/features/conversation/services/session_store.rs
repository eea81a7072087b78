use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::conversation::models::{ConversationSession, ConversationSessionRow};

/// Persistence port for conversation sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored session for `identity`, or a fresh idle one
    async fn load(&self, identity: i64) -> Result<ConversationSession>;

    async fn save(&self, session: &ConversationSession) -> Result<()>;
}

/// Postgres-backed session store
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, identity: i64) -> Result<ConversationSession> {
        let row = sqlx::query_as::<_, ConversationSessionRow>(
            r#"
            SELECT identity, state, context, updated_at
            FROM conversation_sessions
            WHERE identity = $1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load session for {}: {:?}", identity, e);
            AppError::Database(e)
        })?;

        match row {
            Some(row) => row.try_into(),
            None => Ok(ConversationSession::idle(identity)),
        }
    }

    async fn save(&self, session: &ConversationSession) -> Result<()> {
        let context = serde_json::to_value(&session.context).map_err(|e| {
            AppError::Internal(format!("Failed to serialize session context: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO conversation_sessions (identity, state, context, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (identity) DO UPDATE
            SET state = EXCLUDED.state,
                context = EXCLUDED.context,
                updated_at = NOW()
            "#,
        )
        .bind(session.identity)
        .bind(session.state.as_str())
        .bind(&context)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save session for {}: {:?}", session.identity, e);
            AppError::Database(e)
        })?;

        Ok(())
    }
}
