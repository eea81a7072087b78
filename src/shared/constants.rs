/// Length of the trailing window used by every sliding-window limiter
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default number of chat requests allowed per identity inside the window
pub const DEFAULT_CHAT_RATE_LIMIT: u64 = 60;

/// Default number of webhook requests allowed per source address inside the window
pub const DEFAULT_WEBHOOK_RATE_LIMIT: u64 = 10;

// =============================================================================
// REDIS KEY SCOPES
// =============================================================================

/// Key scope for chat identities: `rate_limit:chat:{identity}`
pub const CHAT_RATE_LIMIT_SCOPE: &str = "chat";

/// Key scope for webhook source addresses: `rate_limit:webhook:{addr}`
pub const WEBHOOK_RATE_LIMIT_SCOPE: &str = "webhook";

// =============================================================================
// PAYMENTS
// =============================================================================

/// Prefix placed in front of the service name in vendor payment descriptions
pub const PAYMENT_DESCRIPTION_PREFIX: &str = "Travel Assistant";
