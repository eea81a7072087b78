//! In-memory implementations of the persistence, rate-limit, payment and chat
//! ports for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::conversation::models::ConversationSession;
use crate::features::conversation::{ChatNotifier, Reply, SessionStore};
use crate::features::payments::{
    PaymentError, PaymentGateway, PaymentProvider, PaymentRef, PaymentRequest, WebhookOutcome,
};
use crate::features::rate_limits::services::window_bounds;
use crate::features::rate_limits::RateLimiter;
use crate::features::transactions::{
    NewTransaction, Transaction, TransactionStatus, TransactionStore,
};
use crate::features::users::{UserProfile, UserStore};
use crate::shared::constants::RATE_LIMIT_WINDOW_SECS;
use crate::shared::i18n::Language;

// ==================== Rate limiting ====================

/// Sliding-window limiter with the same admission rule as the Redis one
pub struct InMemoryRateLimiter {
    ceiling: u64,
    window: Duration,
    entries: Mutex<HashMap<String, Vec<i64>>>,
}

impl InMemoryRateLimiter {
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn allow_at(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let (score, cutoff) = window_bounds(now, self.window);
        let mut entries = self.entries.lock().unwrap();
        let window = entries.entry(identity.to_string()).or_default();

        window.push(score);
        window.retain(|recorded| *recorded > cutoff);
        window.len() as u64 <= self.ceiling
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn allow(&self, identity: &str) -> Result<bool> {
        Ok(self.allow_at(identity, Utc::now()).await)
    }
}

/// Limiter whose backing store never answers in time
pub struct UnavailableRateLimiter;

#[async_trait]
impl RateLimiter for UnavailableRateLimiter {
    async fn allow(&self, identity: &str) -> Result<bool> {
        Err(AppError::Timeout(format!("Rate limit check for {}", identity)))
    }
}

// ==================== Users ====================

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<i64, UserProfile>>,
    miss_next_touch: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `touch` report a missing user, as if another writer had
    /// not committed yet
    pub fn fail_next_touch_as_missing(&self) {
        self.miss_next_touch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, identity: i64) -> Result<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&identity).cloned())
    }

    async fn create(&self, identity: i64, language: Language) -> Result<UserProfile> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&identity) {
            return Err(AppError::Conflict(format!("User {} already exists", identity)));
        }

        let now = Utc::now();
        let profile = UserProfile {
            identity,
            language,
            created_at: now,
            last_active: now,
            preferences: serde_json::json!({}),
        };
        users.insert(identity, profile.clone());
        Ok(profile)
    }

    async fn touch(&self, identity: i64) -> Result<Option<UserProfile>> {
        if self.miss_next_touch.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }

        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&identity).map(|profile| {
            profile.last_active = Utc::now();
            profile.clone()
        }))
    }

    async fn set_language(&self, identity: i64, language: Language) -> Result<UserProfile> {
        let mut users = self.users.lock().unwrap();
        let profile = users
            .get_mut(&identity)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity)))?;
        profile.language = language;
        Ok(profile.clone())
    }
}

// ==================== Transactions ====================

#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: Mutex<Vec<Transaction>>,
    fail_writes: AtomicBool,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `create` and `update_status` fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Transaction> {
        self.all().into_iter().find(|t| t.id == id)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AppError::Internal("transaction store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction> {
        self.check_writable()?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::now_v7(),
            user_identity: new.user_identity,
            amount: new.amount,
            currency: new.currency,
            provider: new.provider,
            status: TransactionStatus::Created,
            provider_reference: new.provider_reference,
            payload: new.payload,
            created_at: now,
            updated_at: now,
        };
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        Ok(self
            .all()
            .into_iter()
            .find(|t| t.provider == provider && t.provider_reference == reference))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        event: serde_json::Value,
    ) -> Result<Option<Transaction>> {
        self.check_writable()?;

        let mut transactions = self.transactions.lock().unwrap();
        let Some(transaction) = transactions
            .iter_mut()
            .find(|t| t.id == id && !t.status.is_terminal())
        else {
            return Ok(None);
        };

        transaction.status = status;
        transaction.payload["last_event"] = event;
        transaction.updated_at = Utc::now();
        Ok(Some(transaction.clone()))
    }
}

// ==================== Conversation ====================

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<i64, ConversationSession>>,
    saves: AtomicUsize,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, identity: i64) -> Result<ConversationSession> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(&identity)
            .cloned()
            .unwrap_or_else(|| ConversationSession::idle(identity)))
    }

    async fn save(&self, session: &ConversationSession) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(session.identity, session.clone());
        Ok(())
    }
}

/// Collects notifications instead of sending them
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, Reply)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn notify(&self, identity: i64, reply: Reply) -> Result<()> {
        self.sent.lock().unwrap().push((identity, reply));
        Ok(())
    }
}

// ==================== Payments ====================

/// Gateway that records session requests and answers them locally
pub struct FakeGateway {
    provider: PaymentProvider,
    requests: Mutex<Vec<PaymentRequest>>,
    fail: AtomicBool,
}

impl FakeGateway {
    pub fn new(provider: PaymentProvider) -> Self {
        Self {
            provider,
            requests: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every later session request fail as a vendor error
    pub fn fail_sessions(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn session_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn create_session(
        &self,
        request: &PaymentRequest,
    ) -> std::result::Result<PaymentRef, PaymentError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Vendor("vendor unavailable".to_string()));
        }

        let id = format!("{}_session_{}", self.provider, requests.len());
        Ok(PaymentRef {
            redirect_url: format!("https://pay.example.com/{}", id),
            payload: serde_json::json!({ "id": id }),
            id,
            provider: self.provider,
        })
    }

    async fn verify_webhook(
        &self,
        _headers: &HeaderMap,
        _body: &[u8],
    ) -> std::result::Result<WebhookOutcome, PaymentError> {
        Err(PaymentError::Signature("fake gateway accepts no webhooks".to_string()))
    }
}
