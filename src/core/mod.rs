pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod middleware;
