mod rate_limit_service;

pub use rate_limit_service::{window_bounds, RateLimiter, RedisRateLimiter};
