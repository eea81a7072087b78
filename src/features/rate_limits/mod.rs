//! Sliding-window rate limiting.
//!
//! Used twice: per chat identity in front of the conversation controller, and per
//! source address in front of the public webhook endpoints.

pub mod services;

pub use services::{RateLimiter, RedisRateLimiter};
