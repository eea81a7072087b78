use std::sync::Arc;
use std::time::Instant;

use crate::core::error::{AppError, Result};
use crate::core::metrics::Metrics;
use crate::features::conversation::models::{
    service_menu, ConversationSession, ConversationState, InboundUpdate, Input, Reply,
    ReplyMarkup, ServiceOption,
};
use crate::features::conversation::services::{CheckoutService, SessionStore};
use crate::features::rate_limits::RateLimiter;
use crate::features::users::models::UserProfile;
use crate::features::users::UserProfileService;
use crate::shared::i18n::{Language, TextKey, Translations};

/// Drives the service-selection dialogue for every inbound chat update.
///
/// Each update is rate limited, attached to a user profile and dispatched
/// against the identity's persisted session:
///
/// ```text
/// Idle --/start--> SelectingService --valid choice--> AwaitingPayment
///   ^                    |                                  |
///   +--invalid / payment error / /cancel -------------------+
/// ```
///
/// Errors never escape [`ConversationController::handle`]; they become a
/// localized generic error and the session falls back to `Idle`.
pub struct ConversationController {
    rate_limiter: Arc<dyn RateLimiter>,
    users: Arc<UserProfileService>,
    sessions: Arc<dyn SessionStore>,
    checkout: Arc<CheckoutService>,
    translations: Arc<Translations>,
    metrics: Arc<Metrics>,
}

impl ConversationController {
    pub fn new(
        rate_limiter: Arc<dyn RateLimiter>,
        users: Arc<UserProfileService>,
        sessions: Arc<dyn SessionStore>,
        checkout: Arc<CheckoutService>,
        translations: Arc<Translations>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rate_limiter,
            users,
            sessions,
            checkout,
            translations,
            metrics,
        }
    }

    pub async fn handle(&self, update: InboundUpdate) -> Vec<Reply> {
        let started = Instant::now();
        let endpoint = update.input.name();

        let replies = self.admit_and_process(&update).await;

        self.metrics
            .observe_response_time(endpoint, started.elapsed());
        replies
    }

    async fn admit_and_process(&self, update: &InboundUpdate) -> Vec<Reply> {
        let mut language = self.translations.negotiate(update.locale.as_deref());

        match self.rate_limiter.allow(&update.identity.to_string()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Rate limited chat update from {}", update.identity);
                return vec![self.reply(TextKey::RateLimited, language)];
            }
            Err(e) => {
                tracing::error!(
                    "Rate limiter unavailable for {}, rejecting update: {}",
                    update.identity,
                    e
                );
                return vec![self.reply(TextKey::GenericError, language)];
            }
        }

        self.metrics.record_command(update.input.name());

        match self.process(update, &mut language).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!(
                    "Failed to handle {} from {}: {}",
                    update.input.name(),
                    update.identity,
                    e
                );
                let idle = ConversationSession::idle(update.identity);
                if let Err(e) = self.sessions.save(&idle).await {
                    tracing::warn!("Failed to reset session for {}: {}", update.identity, e);
                }
                vec![self.reply(TextKey::GenericError, language)]
            }
        }
    }

    async fn process(&self, update: &InboundUpdate, language: &mut Language) -> Result<Vec<Reply>> {
        let profile = self
            .users
            .get_or_create(update.identity, update.locale.as_deref())
            .await?;
        *language = profile.language;

        let mut session = self.sessions.load(update.identity).await?;
        let replies = self
            .dispatch(&profile, &mut session, &update.input, language)
            .await?;
        self.sessions.save(&session).await?;

        Ok(replies)
    }

    async fn dispatch(
        &self,
        profile: &UserProfile,
        session: &mut ConversationSession,
        input: &Input,
        language: &mut Language,
    ) -> Result<Vec<Reply>> {
        match input {
            Input::Start => {
                session.reset();
                session.state = ConversationState::SelectingService;
                Ok(vec![self.menu(*language)])
            }
            Input::Help => Ok(vec![self.reply(TextKey::Help, *language)]),
            Input::Cancel => {
                session.reset();
                Ok(vec![self
                    .reply(TextKey::Cancelled, *language)
                    .with_markup(ReplyMarkup::RemoveKeyboard)])
            }
            Input::Language(tag) => self.change_language(profile, tag, language).await,
            Input::Text(text) => match session.state {
                ConversationState::Idle => Ok(vec![self.reply(TextKey::StartHint, *language)]),
                ConversationState::SelectingService | ConversationState::AwaitingPayment => {
                    self.select_service(profile, session, text, *language).await
                }
            },
        }
    }

    async fn select_service(
        &self,
        profile: &UserProfile,
        session: &mut ConversationSession,
        text: &str,
        language: Language,
    ) -> Result<Vec<Reply>> {
        let Some(option) = ServiceOption::find(text, &self.translations) else {
            tracing::debug!("Invalid service selection from {}: {:?}", profile.identity, text);
            session.reset();
            return Ok(vec![self
                .reply(TextKey::InvalidSelection, language)
                .with_markup(ReplyMarkup::RemoveKeyboard)]);
        };

        match self.checkout.checkout(profile.identity, option).await {
            Ok(checkout) => {
                session.state = ConversationState::AwaitingPayment;
                session.context.service = Some(option.name.to_string());
                session.context.transaction_id = Some(checkout.transaction.id);

                Ok(vec![self.reply(TextKey::PaymentLink, language).with_markup(
                    ReplyMarkup::PaymentLink {
                        label: self
                            .translations
                            .text(TextKey::PaymentButton, language)
                            .to_string(),
                        url: checkout.payment.redirect_url,
                    },
                )])
            }
            Err(AppError::Payment(e)) => {
                tracing::warn!(
                    "Payment for {} failed for user {}: {}",
                    option.name,
                    profile.identity,
                    e
                );
                session.reset();
                Ok(vec![self
                    .reply(TextKey::PaymentError, language)
                    .with_markup(ReplyMarkup::RemoveKeyboard)])
            }
            Err(e) => Err(e),
        }
    }

    async fn change_language(
        &self,
        profile: &UserProfile,
        tag: &str,
        language: &mut Language,
    ) -> Result<Vec<Reply>> {
        match self.translations.parse_supported(tag) {
            Some(requested) => {
                self.users.set_language(profile.identity, requested).await?;
                *language = requested;
                tracing::info!("User {} switched language to {}", profile.identity, requested);
                Ok(vec![self.reply(TextKey::LanguageChanged, requested)])
            }
            None => {
                let available = self
                    .translations
                    .supported()
                    .iter()
                    .map(Language::code)
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(vec![Reply::text(format!(
                    "{} {}",
                    self.translations.text(TextKey::LanguageUnsupported, *language),
                    available
                ))])
            }
        }
    }

    fn menu(&self, language: Language) -> Reply {
        Reply::text(format!(
            "{}\n\n{}",
            self.translations.text(TextKey::Welcome, language),
            self.translations.text(TextKey::SelectService, language)
        ))
        .with_markup(ReplyMarkup::ServiceMenu(service_menu(
            &self.translations,
            language,
        )))
    }

    fn reply(&self, key: TextKey, language: Language) -> Reply {
        Reply::text(self.translations.text(key, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::payments::{PaymentOrchestrator, PaymentProvider};
    use crate::features::transactions::TransactionStatus;
    use crate::features::users::services::UserStore;
    use crate::shared::test_helpers::{
        FakeGateway, InMemoryRateLimiter, InMemorySessionStore, InMemoryTransactionStore,
        InMemoryUserStore, UnavailableRateLimiter,
    };

    struct Harness {
        controller: ConversationController,
        users: Arc<InMemoryUserStore>,
        sessions: Arc<InMemorySessionStore>,
        transactions: Arc<InMemoryTransactionStore>,
        gateway: Arc<FakeGateway>,
        metrics: Arc<Metrics>,
        translations: Arc<Translations>,
    }

    fn harness(ceiling: u64) -> Harness {
        harness_with_limiter(Arc::new(InMemoryRateLimiter::new(ceiling)))
    }

    fn harness_with_limiter(rate_limiter: Arc<dyn RateLimiter>) -> Harness {
        let translations = Arc::new(Translations::new(Language::ALL.to_vec()));
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let gateway = Arc::new(FakeGateway::new(PaymentProvider::Stripe));
        let metrics = Arc::new(Metrics::new().unwrap());

        let checkout = CheckoutService::new(
            Arc::new(PaymentOrchestrator::new().register(gateway.clone())),
            transactions.clone(),
            Arc::clone(&metrics),
            PaymentProvider::Stripe,
            "USD".to_string(),
        );
        let controller = ConversationController::new(
            rate_limiter,
            Arc::new(UserProfileService::new(
                users.clone(),
                Arc::clone(&translations),
            )),
            sessions.clone(),
            Arc::new(checkout),
            Arc::clone(&translations),
            Arc::clone(&metrics),
        );

        Harness {
            controller,
            users,
            sessions,
            transactions,
            gateway,
            metrics,
            translations,
        }
    }

    fn update(identity: i64, locale: Option<&str>, input: Input) -> InboundUpdate {
        InboundUpdate {
            identity,
            locale: locale.map(str::to_string),
            input,
        }
    }

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    async fn state_of(h: &Harness, identity: i64) -> ConversationState {
        h.sessions.load(identity).await.unwrap().state
    }

    #[tokio::test]
    async fn test_first_start_creates_russian_profile_and_welcomes() {
        let h = harness(60);

        let replies = h.controller.handle(update(42, Some("ru"), Input::Start)).await;

        let profile = h.users.get(42).await.unwrap().unwrap();
        assert_eq!(profile.language, Language::Ru);
        assert_eq!(replies.len(), 1);
        assert!(replies[0]
            .text
            .contains(h.translations.text(TextKey::Welcome, Language::Ru)));
        assert!(matches!(replies[0].markup, ReplyMarkup::ServiceMenu(_)));
        assert_eq!(h.metrics.command_count("start"), 1);
        assert_eq!(state_of(&h, 42).await, ConversationState::SelectingService);
    }

    #[tokio::test]
    async fn test_request_over_ceiling_gets_rate_limit_notice() {
        let h = harness(60);
        let welcome = h.translations.text(TextKey::Welcome, Language::En);
        let limited = h.translations.text(TextKey::RateLimited, Language::En);

        for _ in 0..60 {
            let replies = h.controller.handle(update(42, Some("en"), Input::Start)).await;
            assert!(replies[0].text.contains(welcome));
        }
        let replies = h.controller.handle(update(42, Some("en"), Input::Start)).await;

        assert_eq!(replies, vec![Reply::text(limited)]);
        assert_eq!(h.metrics.command_count("start"), 60);
    }

    #[tokio::test]
    async fn test_rate_limited_update_leaves_no_trace() {
        let h = harness(0);

        let replies = h.controller.handle(update(7, Some("es"), Input::Start)).await;

        assert_eq!(
            replies,
            vec![Reply::text(h.translations.text(TextKey::RateLimited, Language::Es))]
        );
        assert!(h.users.get(7).await.unwrap().is_none());
        assert_eq!(h.sessions.saves(), 0);
        assert_eq!(h.metrics.command_count("start"), 0);
    }

    #[tokio::test]
    async fn test_limiter_outage_rejects_with_generic_error() {
        let h = harness_with_limiter(Arc::new(UnavailableRateLimiter));

        let replies = h.controller.handle(update(42, Some("ru"), Input::Start)).await;

        assert_eq!(
            replies,
            vec![Reply::text("Произошла ошибка. Пожалуйста, попробуйте позже.")]
        );
        assert!(h.users.get(42).await.unwrap().is_none());
        assert_eq!(h.sessions.saves(), 0);
        assert_eq!(h.metrics.command_count("start"), 0);
        assert_eq!(h.gateway.session_calls(), 0);
    }

    #[tokio::test]
    async fn test_hotels_with_vendor_failure_returns_to_idle() {
        let h = harness(60);
        h.gateway.fail_sessions();

        h.controller.handle(update(42, Some("ru"), Input::Start)).await;
        let replies = h.controller.handle(update(42, Some("ru"), text("🏨 Отели"))).await;

        assert!(h
            .gateway
            .last_request()
            .unwrap()
            .description
            .contains("Hotels"));
        assert_eq!(
            replies[0].text,
            h.translations.text(TextKey::PaymentError, Language::Ru)
        );
        assert_eq!(state_of(&h, 42).await, ConversationState::Idle);
        assert!(h.transactions.all().is_empty());
        assert_eq!(h.metrics.payment_count("stripe", "failed"), 1);
    }

    #[tokio::test]
    async fn test_valid_selection_sends_payment_link() {
        let h = harness(60);

        h.controller.handle(update(42, Some("en"), Input::Start)).await;
        let replies = h.controller.handle(update(42, Some("en"), text("Hotels"))).await;

        let transaction = h.transactions.all().pop().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Created);
        match &replies[0].markup {
            ReplyMarkup::PaymentLink { label, url } => {
                assert_eq!(label, "Pay now");
                assert!(url.contains(&transaction.provider_reference));
            }
            other => panic!("expected payment link, got {:?}", other),
        }

        let session = h.sessions.load(42).await.unwrap();
        assert!(session.awaits(transaction.id));
        assert_eq!(session.context.service.as_deref(), Some("Hotels"));
    }

    #[tokio::test]
    async fn test_invalid_selection_returns_to_idle() {
        let h = harness(60);

        h.controller.handle(update(1, None, Input::Start)).await;
        let replies = h.controller.handle(update(1, None, text("Submarines"))).await;

        assert_eq!(
            replies[0].text,
            h.translations.text(TextKey::InvalidSelection, Language::En)
        );
        assert_eq!(h.gateway.session_calls(), 0);
        assert_eq!(state_of(&h, 1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_text_while_idle_gets_start_hint() {
        let h = harness(60);

        let replies = h.controller.handle(update(1, None, text("Hotels"))).await;

        assert_eq!(
            replies[0].text,
            h.translations.text(TextKey::StartHint, Language::En)
        );
        assert_eq!(h.gateway.session_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_resets_pending_payment() {
        let h = harness(60);

        h.controller.handle(update(1, None, Input::Start)).await;
        h.controller.handle(update(1, None, text("Flights"))).await;
        assert_eq!(state_of(&h, 1).await, ConversationState::AwaitingPayment);

        let replies = h.controller.handle(update(1, None, Input::Cancel)).await;

        assert_eq!(replies[0].markup, ReplyMarkup::RemoveKeyboard);
        assert_eq!(h.sessions.load(1).await.unwrap(), ConversationSession::idle(1));
    }

    #[tokio::test]
    async fn test_language_command_persists_and_replies_in_new_language() {
        let h = harness(60);

        h.controller.handle(update(5, Some("en"), Input::Help)).await;
        let replies = h
            .controller
            .handle(update(5, Some("en"), Input::Language("es".to_string())))
            .await;

        assert_eq!(
            replies[0].text,
            h.translations.text(TextKey::LanguageChanged, Language::Es)
        );
        assert_eq!(h.users.get(5).await.unwrap().unwrap().language, Language::Es);

        let replies = h.controller.handle(update(5, Some("en"), Input::Help)).await;
        assert_eq!(replies[0].text, h.translations.text(TextKey::Help, Language::Es));
    }

    #[tokio::test]
    async fn test_unsupported_language_lists_available_codes() {
        let h = harness(60);

        let replies = h
            .controller
            .handle(update(5, None, Input::Language("de".to_string())))
            .await;

        assert!(replies[0].text.ends_with("en, ru, es, zh"));
        assert_eq!(h.users.get(5).await.unwrap().unwrap().language, Language::En);
    }

    #[tokio::test]
    async fn test_store_failure_yields_generic_error_and_idle_session() {
        let h = harness(60);

        h.controller.handle(update(3, Some("ru"), Input::Start)).await;
        h.transactions.fail_writes();
        let replies = h.controller.handle(update(3, Some("ru"), text("Hotels"))).await;

        assert_eq!(
            replies[0].text,
            h.translations.text(TextKey::GenericError, Language::Ru)
        );
        assert_eq!(state_of(&h, 3).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_every_dispatch_is_timed() {
        let h = harness(60);

        h.controller.handle(update(1, None, Input::Help)).await;
        h.controller.handle(update(1, None, text("hi"))).await;

        let exposition = h.metrics.render().unwrap();
        assert!(exposition.contains("response_time_seconds_count{endpoint=\"help\"} 1"));
        assert!(exposition.contains("response_time_seconds_count{endpoint=\"text\"} 1"));
    }
}
