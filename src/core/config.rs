use std::env;
use std::net::IpAddr;
use std::time::Duration;

use crate::features::payments::PaymentProvider;
use crate::shared::constants::{DEFAULT_CHAT_RATE_LIMIT, DEFAULT_WEBHOOK_RATE_LIMIT};
use crate::shared::i18n::Language;
use crate::shared::validation::CURRENCY_REGEX;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub telegram: TelegramConfig,
    pub rate_limit: RateLimitConfig,
    pub i18n: I18nConfig,
    pub payments: PaymentsConfig,
    pub paypal: PayPalConfig,
    pub stripe: StripeConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Upper bound for a single rate-limit round trip
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum chat requests per identity inside the sliding window
    pub chat_ceiling: u64,
    /// Maximum webhook requests per source address inside the sliding window
    pub webhook_ceiling: u64,
    /// Peers allowed to report the client address through `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct I18nConfig {
    pub supported_languages: Vec<Language>,
}

/// Settings shared by every payment provider
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub default_provider: PaymentProvider,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalMode {
    Sandbox,
    Live,
}

#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub webhook_id: String,
    pub mode: PayPalMode,
}

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
}

/// Optional basic auth in front of the Prometheus exposition endpoint
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            telegram: TelegramConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            i18n: I18nConfig::from_env()?,
            payments: PaymentsConfig::from_env()?,
            paypal: PayPalConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            metrics: MetricsConfig::from_env()?,
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("{} environment variable is required", name))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        Ok(Self { host, port })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl RedisConfig {
    const DEFAULT_TIMEOUT_MS: u64 = 2000;

    pub fn from_env() -> Result<Self, String> {
        let url = required("REDIS_URL")?;
        let timeout_ms = parse_or("REDIS_TIMEOUT_MS", Self::DEFAULT_TIMEOUT_MS)?;

        Ok(Self {
            url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

impl TelegramConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
        })
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self, String> {
        let chat_ceiling = parse_or("RATE_LIMIT", DEFAULT_CHAT_RATE_LIMIT)?;
        let webhook_ceiling = parse_or("WEBHOOK_RATE_LIMIT", DEFAULT_WEBHOOK_RATE_LIMIT)?;

        if chat_ceiling == 0 || webhook_ceiling == 0 {
            return Err("RATE_LIMIT and WEBHOOK_RATE_LIMIT must be greater than zero".to_string());
        }

        let trusted_proxies = match env::var("TRUSTED_PROXIES") {
            Ok(raw) => parse_trusted_proxies(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            chat_ceiling,
            webhook_ceiling,
            trusted_proxies,
        })
    }
}

/// Parse a comma-separated list of proxy IP addresses.
pub fn parse_trusted_proxies(raw: &str) -> Result<Vec<IpAddr>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|addr| {
            addr.parse::<IpAddr>()
                .map_err(|_| format!("TRUSTED_PROXIES contains invalid address '{}'", addr))
        })
        .collect()
}

impl I18nConfig {
    pub fn from_env() -> Result<Self, String> {
        let supported_languages = match env::var("SUPPORTED_LANGUAGES") {
            Ok(raw) => parse_language_list(&raw)?,
            Err(_) => Language::ALL.to_vec(),
        };

        Ok(Self {
            supported_languages,
        })
    }
}

/// Parse a comma-separated language list, restricted to the built-in table.
pub fn parse_language_list(raw: &str) -> Result<Vec<Language>, String> {
    let mut languages = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let language = Language::from_code(code)
            .ok_or_else(|| format!("SUPPORTED_LANGUAGES contains unknown language '{}'", code))?;
        if !languages.contains(&language) {
            languages.push(language);
        }
    }

    if !languages.contains(&Language::DEFAULT) {
        return Err(format!(
            "SUPPORTED_LANGUAGES must include the default language '{}'",
            Language::DEFAULT.code()
        ));
    }

    Ok(languages)
}

impl PaymentsConfig {
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

    pub fn from_env() -> Result<Self, String> {
        let default_provider = env::var("PAYMENT_PROVIDER")
            .unwrap_or_else(|_| "stripe".to_string())
            .parse::<PaymentProvider>()
            .map_err(|e| format!("Invalid PAYMENT_PROVIDER: {}", e))?;

        let currency = env::var("PAYMENT_CURRENCY")
            .unwrap_or_else(|_| "USD".to_string())
            .trim()
            .to_uppercase();
        if !CURRENCY_REGEX.is_match(&currency) {
            return Err(format!(
                "PAYMENT_CURRENCY must be a three-letter ISO code, got '{}'",
                currency
            ));
        }

        let success_url = env::var("PAYMENT_SUCCESS_URL")
            .unwrap_or_else(|_| "https://example.com/payment/success".to_string());
        let cancel_url = env::var("PAYMENT_CANCEL_URL")
            .unwrap_or_else(|_| "https://example.com/payment/cancel".to_string());

        let http_timeout_secs =
            parse_or("PAYMENT_HTTP_TIMEOUT_SECS", Self::DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            default_provider,
            currency,
            success_url,
            cancel_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

impl PayPalMode {
    pub fn api_base_url(&self) -> &'static str {
        match self {
            PayPalMode::Sandbox => "https://api-m.sandbox.paypal.com",
            PayPalMode::Live => "https://api-m.paypal.com",
        }
    }
}

impl std::str::FromStr for PayPalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PayPalMode::Sandbox),
            "live" => Ok(PayPalMode::Live),
            other => Err(format!("PAYPAL_MODE must be 'sandbox' or 'live', got '{}'", other)),
        }
    }
}

impl PayPalConfig {
    pub fn from_env() -> Result<Self, String> {
        let mode = env::var("PAYPAL_MODE")
            .unwrap_or_else(|_| "sandbox".to_string())
            .parse::<PayPalMode>()?;

        Ok(Self {
            client_id: required("PAYPAL_CLIENT_ID")?,
            client_secret: required("PAYPAL_CLIENT_SECRET")?,
            webhook_id: required("PAYPAL_WEBHOOK_ID")?,
            mode,
        })
    }
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("webhook_id", &self.webhook_id)
            .field("mode", &self.mode)
            .finish()
    }
}

impl StripeConfig {
    const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            webhook_tolerance_secs: parse_or(
                "STRIPE_WEBHOOK_TOLERANCE_SECS",
                Self::DEFAULT_WEBHOOK_TOLERANCE_SECS,
            )?,
        })
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"***")
            .field("webhook_secret", &"***")
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .finish()
    }
}

impl MetricsConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("METRICS_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("METRICS_PASSWORD").ok().filter(|s| !s.is_empty());

        Ok(Self { username, password })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
