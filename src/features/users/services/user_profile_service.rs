use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::users::models::UserProfile;
use crate::features::users::services::UserStore;
use crate::shared::i18n::{Language, Translations};

/// Service for resolving chat identities to user profiles
pub struct UserProfileService {
    store: Arc<dyn UserStore>,
    translations: Arc<Translations>,
}

impl UserProfileService {
    pub fn new(store: Arc<dyn UserStore>, translations: Arc<Translations>) -> Self {
        Self {
            store,
            translations,
        }
    }

    /// Fetch the profile for `identity`, creating it on first contact.
    ///
    /// A new profile takes its language from `locale` (or the default language).
    /// When two first-contact messages race, the loser's insert conflicts and it
    /// reads the winner's row instead.
    pub async fn get_or_create(&self, identity: i64, locale: Option<&str>) -> Result<UserProfile> {
        if let Some(profile) = self.store.touch(identity).await? {
            return Ok(profile);
        }

        let language = self.translations.negotiate(locale);
        match self.store.create(identity, language).await {
            Ok(profile) => Ok(profile),
            Err(AppError::Conflict(_)) => {
                tracing::debug!("Lost first-contact race for user {}, re-reading", identity);
                self.store.get(identity).await?.ok_or_else(|| {
                    AppError::Internal(format!(
                        "User {} conflicted on insert but cannot be read",
                        identity
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn set_language(&self, identity: i64, language: Language) -> Result<UserProfile> {
        self.store.set_language(identity, language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryUserStore;

    fn service(store: Arc<InMemoryUserStore>) -> UserProfileService {
        UserProfileService::new(store, Arc::new(Translations::new(Language::ALL.to_vec())))
    }

    #[tokio::test]
    async fn test_new_identity_takes_first_seen_locale() {
        let store = Arc::new(InMemoryUserStore::new());
        let profile = service(Arc::clone(&store))
            .get_or_create(42, Some("ru"))
            .await
            .unwrap();

        assert_eq!(profile.identity, 42);
        assert_eq!(profile.language, Language::Ru);
        assert!(store.get(42).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_new_identity_without_supported_locale_gets_english() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service(store);

        let absent = service.get_or_create(1, None).await.unwrap();
        let unsupported = service.get_or_create(2, Some("de-DE")).await.unwrap();

        assert_eq!(absent.language, Language::En);
        assert_eq!(unsupported.language, Language::En);
    }

    #[tokio::test]
    async fn test_existing_identity_keeps_persisted_language() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service(store);

        service.get_or_create(42, Some("es")).await.unwrap();
        let again = service.get_or_create(42, Some("ru")).await.unwrap();

        assert_eq!(again.language, Language::Es);
    }

    #[tokio::test]
    async fn test_lost_race_reads_winner_row() {
        let store = Arc::new(InMemoryUserStore::new());
        // The winner is inserted between our touch and our create
        store.fail_next_touch_as_missing();
        store.create(42, Language::Zh).await.unwrap();

        let profile = service(store).get_or_create(42, Some("ru")).await.unwrap();

        assert_eq!(profile.language, Language::Zh);
    }

    #[tokio::test]
    async fn test_set_language_persists() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service(Arc::clone(&store));

        service.get_or_create(42, Some("en")).await.unwrap();
        service.set_language(42, Language::Ru).await.unwrap();

        assert_eq!(store.get(42).await.unwrap().unwrap().language, Language::Ru);
    }
}
