use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::features::payments::PaymentError;

/// Response from the PayPal OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

struct TokenCache {
    token: TokenResponse,
    fetched_at: Instant,
}

/// Client-credentials access tokens for the PayPal REST API, cached until near expiry
pub struct PayPalTokenManager {
    client: reqwest::Client,
    api_base_url: String,
    client_id: String,
    client_secret: String,
    cache: Arc<RwLock<Option<TokenCache>>>,
    /// Refresh this long before the token expires
    refresh_margin: Duration,
}

impl PayPalTokenManager {
    pub fn new(
        client: reqwest::Client,
        api_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: Arc::new(RwLock::new(None)),
            refresh_margin: Duration::from_secs(60),
        }
    }

    pub async fn access_token(&self) -> Result<String, PaymentError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if is_fresh(cached.fetched_at.elapsed(), cached.token.expires_in, self.refresh_margin) {
                    return Ok(cached.token.access_token.clone());
                }
            }
        }

        self.fetch_token().await
    }

    async fn fetch_token(&self) -> Result<String, PaymentError> {
        tracing::debug!("Fetching new PayPal access token from {}", self.api_base_url);

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::Vendor(format!("PayPal token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Vendor(format!(
                "PayPal token request failed: HTTP {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Vendor(format!("Unreadable PayPal token: {}", e)))?;

        tracing::info!("Fetched new PayPal access token, expires in {} seconds", token.expires_in);

        let access_token = token.access_token.clone();
        let mut cache = self.cache.write().await;
        *cache = Some(TokenCache {
            token,
            fetched_at: Instant::now(),
        });

        Ok(access_token)
    }
}

fn is_fresh(elapsed: Duration, expires_in: u64, margin: Duration) -> bool {
    elapsed + margin < Duration::from_secs(expires_in)
}
