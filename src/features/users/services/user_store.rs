use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{UserProfile, UserProfileRow};
use crate::shared::i18n::Language;

/// Persistence port for user profiles
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, identity: i64) -> Result<Option<UserProfile>>;

    /// Insert a new profile. A profile that already exists yields `AppError::Conflict`.
    async fn create(&self, identity: i64, language: Language) -> Result<UserProfile>;

    /// Refresh `last_active`, returning the profile if it exists
    async fn touch(&self, identity: i64) -> Result<Option<UserProfile>>;

    async fn set_language(&self, identity: i64, language: Language) -> Result<UserProfile>;
}

/// Postgres-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, identity: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            r#"
            SELECT identity, language, created_at, last_active, preferences
            FROM users
            WHERE identity = $1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user {}: {:?}", identity, e);
            AppError::Database(e)
        })?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, identity: i64, language: Language) -> Result<UserProfile> {
        // The unique key on identity decides concurrent first contacts
        let row = sqlx::query_as::<_, UserProfileRow>(
            r#"
            INSERT INTO users (identity, language, created_at, last_active, preferences)
            VALUES ($1, $2, NOW(), NOW(), '{}'::jsonb)
            ON CONFLICT (identity) DO NOTHING
            RETURNING identity, language, created_at, last_active, preferences
            "#,
        )
        .bind(identity)
        .bind(language.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user {}: {:?}", identity, e);
            AppError::Database(e)
        })?;

        match row {
            Some(row) => {
                tracing::info!("Created user {} with language {}", identity, language);
                Ok(row.into())
            }
            None => Err(AppError::Conflict(format!(
                "User {} already exists",
                identity
            ))),
        }
    }

    async fn touch(&self, identity: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            r#"
            UPDATE users
            SET last_active = NOW()
            WHERE identity = $1
            RETURNING identity, language, created_at, last_active, preferences
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to touch user {}: {:?}", identity, e);
            AppError::Database(e)
        })?;

        Ok(row.map(Into::into))
    }

    async fn set_language(&self, identity: i64, language: Language) -> Result<UserProfile> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            r#"
            UPDATE users
            SET language = $2, last_active = NOW()
            WHERE identity = $1
            RETURNING identity, language, created_at, last_active, preferences
            "#,
        )
        .bind(identity)
        .bind(language.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set language for user {}: {:?}", identity, e);
            AppError::Database(e)
        })?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity)))
    }
}
