use async_trait::async_trait;
use teloxide::prelude::*;

use crate::core::error::{AppError, Result};
use crate::features::conversation::{ChatNotifier, Reply};
use crate::features::telegram::dispatcher::send_reply;

/// Delivers out-of-band messages, such as payment outcomes, through the bot
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    async fn notify(&self, identity: i64, reply: Reply) -> Result<()> {
        send_reply(&self.bot, ChatId(identity), reply)
            .await
            .map_err(|e| {
                tracing::error!("Failed to notify chat {}: {}", identity, e);
                AppError::ExternalServiceError(format!("Telegram delivery failed: {}", e))
            })
    }
}
