use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::conversation::models::Reply;

/// Pushes messages to a chat outside of a request/reply exchange
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn notify(&self, identity: i64, reply: Reply) -> Result<()>;
}
