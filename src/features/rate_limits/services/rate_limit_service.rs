use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::RATE_LIMIT_WINDOW_SECS;

/// Per-identity request admission
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request for `identity` and report whether it is within the ceiling
    async fn allow(&self, identity: &str) -> Result<bool>;
}

/// Bounds of the trailing window ending at `now`, in epoch milliseconds.
///
/// Returns `(score, cutoff)`: the score recorded for this request and the
/// newest score that is already outside the window.
pub fn window_bounds(now: DateTime<Utc>, window: Duration) -> (i64, i64) {
    let score = now.timestamp_millis();
    (score, score - window.as_millis() as i64)
}

/// The `MULTI` block recording one request at `score`: add it, prune entries at
/// or before `cutoff`, count what is left, refresh the key's expiry.
pub fn window_pipeline(
    key: &str,
    member: &str,
    score: i64,
    cutoff: i64,
    window: Duration,
) -> redis::Pipeline {
    redis::pipe()
        .atomic()
        .zadd(key, member, score)
        .ignore()
        .zrembyscore(key, "-inf", cutoff)
        .ignore()
        .zcard(key)
        .expire(key, window.as_secs() as i64)
        .ignore()
        .to_owned()
}

/// Sliding-window limiter over Redis sorted sets.
///
/// Each identity owns `rate_limit:{scope}:{identity}`. Every call runs one
/// `MULTI` block (add, prune, count, refresh expiry) so concurrent calls for the
/// same identity cannot undercount.
pub struct RedisRateLimiter {
    connection: ConnectionManager,
    scope: &'static str,
    ceiling: u64,
    window: Duration,
    timeout: Duration,
}

impl RedisRateLimiter {
    pub fn new(
        connection: ConnectionManager,
        scope: &'static str,
        ceiling: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            connection,
            scope,
            ceiling,
            window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            timeout,
        }
    }

    fn key(&self, identity: &str) -> String {
        format!("rate_limit:{}:{}", self.scope, identity)
    }

    pub async fn allow_at(&self, identity: &str, now: DateTime<Utc>) -> Result<bool> {
        let key = self.key(identity);
        let (score, cutoff) = window_bounds(now, self.window);
        // Unique member so requests within the same millisecond are all counted
        let member = format!("{}-{}", score, Uuid::new_v4().simple());

        let mut connection = self.connection.clone();
        let pipeline = window_pipeline(&key, &member, score, cutoff, self.window);

        let (count,): (u64,) =
            tokio::time::timeout(self.timeout, pipeline.query_async(&mut connection))
                .await
                .map_err(|_| {
                    tracing::error!("Rate limit check timed out for {}", key);
                    AppError::Timeout(format!("Rate limit check for {}", key))
                })?
                .map_err(|e| {
                    tracing::error!("Rate limit pipeline failed for {}: {:?}", key, e);
                    AppError::Cache(e)
                })?;

        let allowed = count <= self.ceiling;
        if !allowed {
            tracing::debug!(
                "Rate limit hit for {} ({} requests, ceiling {})",
                key,
                count,
                self.ceiling
            );
        }

        Ok(allowed)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, identity: &str) -> Result<bool> {
        self.allow_at(identity, Utc::now()).await
    }
}
