use std::sync::Arc;

use axum::http::HeaderMap;

use crate::core::error::Result;
use crate::core::metrics::Metrics;
use crate::features::conversation::{ChatNotifier, Reply, ReplyMarkup, SessionStore};
use crate::features::payments::{
    PaymentOrchestrator, PaymentProvider, WebhookEvent, WebhookOutcome,
};
use crate::features::transactions::{Transaction, TransactionStatus, TransactionStore};
use crate::features::users::UserStore;
use crate::shared::i18n::{Language, TextKey, Translations};

/// What a verified webhook delivery did
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Event type that does not concern transactions
    Ignored,
    /// No transaction carries the event's reference
    UnknownReference,
    /// Transaction already at this or a terminal status
    Unchanged(TransactionStatus),
    Updated(TransactionStatus),
}

/// Verifies vendor callbacks and reconciles transactions against them
pub struct WebhookService {
    payments: Arc<PaymentOrchestrator>,
    transactions: Arc<dyn TransactionStore>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn ChatNotifier>,
    translations: Arc<Translations>,
    metrics: Arc<Metrics>,
}

impl WebhookService {
    pub fn new(
        payments: Arc<PaymentOrchestrator>,
        transactions: Arc<dyn TransactionStore>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn ChatNotifier>,
        translations: Arc<Translations>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            payments,
            transactions,
            sessions,
            users,
            notifier,
            translations,
            metrics,
        }
    }

    /// Authenticate a raw delivery for `provider` and apply it.
    ///
    /// Unknown or gateway-less providers fail with `UnsupportedProvider`;
    /// unauthentic deliveries fail with `Signature`.
    pub async fn receive(
        &self,
        provider: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Reconciliation> {
        let provider = provider.parse::<PaymentProvider>()?;
        let gateway = self.payments.gateway(provider)?;

        match gateway.verify_webhook(headers, body).await? {
            WebhookOutcome::Ignored { event_type } => {
                tracing::debug!("Ignoring {} webhook event {}", provider, event_type);
                Ok(Reconciliation::Ignored)
            }
            WebhookOutcome::Event(event) => self.reconcile(provider, event).await,
        }
    }

    async fn reconcile(&self, provider: PaymentProvider, event: WebhookEvent) -> Result<Reconciliation> {
        let Some(transaction) = self
            .transactions
            .find_by_reference(provider, &event.provider_reference)
            .await?
        else {
            tracing::warn!(
                "{} webhook {} references unknown payment {}",
                provider,
                event.event_type,
                event.provider_reference
            );
            return Ok(Reconciliation::UnknownReference);
        };

        if !transaction.status.can_transition_to(event.status) {
            tracing::info!(
                "Transaction {} stays {} on {} ({})",
                transaction.id,
                transaction.status,
                event.event_type,
                event.status
            );
            return Ok(Reconciliation::Unchanged(transaction.status));
        }

        let Some(updated) = self
            .transactions
            .update_status(transaction.id, event.status, event.payload)
            .await?
        else {
            // A concurrent delivery reached a terminal status first
            tracing::info!("Transaction {} was settled concurrently", transaction.id);
            return Ok(Reconciliation::Unchanged(transaction.status));
        };

        tracing::info!(
            "Transaction {} moved {} -> {} on {} {}",
            updated.id,
            transaction.status,
            updated.status,
            provider,
            event.event_type
        );
        self.metrics
            .record_payment(provider.as_str(), updated.status.as_str());

        if updated.status.is_terminal() {
            self.finish_conversation(&updated).await;
        }

        Ok(Reconciliation::Updated(updated.status))
    }

    /// Close the owner's dialogue and tell them the outcome; failures are logged only
    async fn finish_conversation(&self, transaction: &Transaction) {
        let identity = transaction.user_identity;

        match self.sessions.load(identity).await {
            Ok(mut session) if session.awaits(transaction.id) => {
                session.reset();
                if let Err(e) = self.sessions.save(&session).await {
                    tracing::warn!("Failed to reset session for {}: {}", identity, e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to load session for {}: {}", identity, e),
        }

        let language = match self.users.get(identity).await {
            Ok(Some(profile)) => profile.language,
            Ok(None) => Language::DEFAULT,
            Err(e) => {
                tracing::warn!("Failed to read language of {}: {}", identity, e);
                Language::DEFAULT
            }
        };

        let key = match transaction.status {
            TransactionStatus::Succeeded => TextKey::PaymentReceived,
            _ => TextKey::PaymentFailed,
        };
        let reply = Reply::text(self.translations.text(key, language))
            .with_markup(ReplyMarkup::RemoveKeyboard);

        if let Err(e) = self.notifier.notify(identity, reply).await {
            tracing::warn!(
                "Failed to notify {} about transaction {}: {}",
                identity,
                transaction.id,
                e
            );
        }
    }
}
