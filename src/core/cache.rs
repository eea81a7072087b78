use redis::aio::ConnectionManager;

use crate::core::config::RedisConfig;
use crate::core::error::{AppError, Result};

/// Open a multiplexed, auto-reconnecting connection and verify it with PING.
pub async fn create_connection(config: &RedisConfig) -> Result<ConnectionManager> {
    let client = redis::Client::open(config.url.as_str())?;

    let mut connection = tokio::time::timeout(config.timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| AppError::Timeout("Connecting to Redis".to_string()))??;

    let pong: String = tokio::time::timeout(
        config.timeout,
        redis::cmd("PING").query_async(&mut connection),
    )
    .await
    .map_err(|_| AppError::Timeout("Redis PING".to_string()))??;
    tracing::debug!("Redis answered {}", pong);

    Ok(connection)
}
