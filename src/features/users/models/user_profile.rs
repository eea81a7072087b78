use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::shared::i18n::Language;

/// Database row of the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileRow {
    pub identity: i64,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub preferences: serde_json::Value,
}

/// A chat participant known to the bot
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub identity: i64,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub preferences: serde_json::Value,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        let language = Language::from_code(&row.language).unwrap_or_else(|| {
            tracing::warn!(
                "User {} has unknown stored language '{}', using default",
                row.identity,
                row.language
            );
            Language::DEFAULT
        });

        Self {
            identity: row.identity,
            language,
            created_at: row.created_at,
            last_active: row.last_active,
            preferences: row.preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_with_unknown_language_maps_to_default() {
        let now = Utc::now();
        let profile: UserProfile = UserProfileRow {
            identity: 42,
            language: "klingon".to_string(),
            created_at: now,
            last_active: now,
            preferences: serde_json::json!({}),
        }
        .into();

        assert_eq!(profile.language, Language::En);
        assert_eq!(profile.identity, 42);
    }
}
