use std::sync::Arc;

use teloxide::dispatching::{DefaultKey, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
};
use teloxide::utils::command::BotCommands;

use crate::features::conversation::{ConversationController, InboundUpdate, Input, Reply, ReplyMarkup};
use crate::features::telegram::commands::Command;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Handler tree: known bot commands, then plain text, then unknown commands
pub fn schema() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(is_plain_text))
                .endpoint(text_handler),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|text| !is_plain_text(text)))
                .endpoint(unknown_command_handler),
        )
}

/// Text that is not a slash command and may be a menu choice
fn is_plain_text(text: &str) -> bool {
    !text.trim_start().starts_with('/')
}

/// Build the long-polling dispatcher around `controller`
pub async fn build(
    bot: Bot,
    controller: Arc<ConversationController>,
) -> Dispatcher<Bot, HandlerError, DefaultKey> {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![controller])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Failed to deliver Telegram reply",
        ))
        .enable_ctrlc_handler()
        .build()
}

async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    controller: Arc<ConversationController>,
) -> Result<(), HandlerError> {
    let update = inbound(&msg, cmd.into());
    let replies = controller.handle(update).await;
    send_replies(&bot, msg.chat.id, replies).await
}

async fn text_handler(
    bot: Bot,
    msg: Message,
    controller: Arc<ConversationController>,
) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let update = inbound(&msg, Input::Text(text.to_string()));
    let replies = controller.handle(update).await;
    send_replies(&bot, msg.chat.id, replies).await
}

/// Slash commands the bot does not know get the help text
async fn unknown_command_handler(
    bot: Bot,
    msg: Message,
    controller: Arc<ConversationController>,
) -> Result<(), HandlerError> {
    tracing::debug!("Unknown command from {}: {:?}", msg.chat.id, msg.text());

    let update = inbound(&msg, Input::Help);
    let replies = controller.handle(update).await;
    send_replies(&bot, msg.chat.id, replies).await
}

fn inbound(msg: &Message, input: Input) -> InboundUpdate {
    InboundUpdate {
        identity: msg.chat.id.0,
        locale: msg.from.as_ref().and_then(|user| user.language_code.clone()),
        input,
    }
}

async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> Result<(), HandlerError> {
    for reply in replies {
        send_reply(bot, chat_id, reply).await?;
    }
    Ok(())
}

/// Send one reply with its keyboard translated to Telegram markup
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<(), HandlerError> {
    let request = bot.send_message(chat_id, reply.text);

    match reply.markup {
        ReplyMarkup::None => request.await?,
        ReplyMarkup::ServiceMenu(rows) => request.reply_markup(service_keyboard(rows)).await?,
        ReplyMarkup::PaymentLink { label, url } => {
            let url = reqwest::Url::parse(&url)?;
            request
                .reply_markup(InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
                    label, url,
                )]]))
                .await?
        }
        ReplyMarkup::RemoveKeyboard => request.reply_markup(KeyboardRemove::new()).await?,
    };

    Ok(())
}

fn service_keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_commands_are_not_menu_text() {
        assert!(is_plain_text("🏨 Hotels"));
        assert!(is_plain_text("hotels / flights"));
        assert!(!is_plain_text("/refund"));
        assert!(!is_plain_text("  /refund 42"));
    }

    #[test]
    fn test_service_keyboard_keeps_layout() {
        let keyboard = service_keyboard(vec![
            vec!["🛡 Insurance".to_string(), "🌐 Translations".to_string()],
            vec!["🏨 Hotels".to_string()],
        ]);

        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0][1].text, "🌐 Translations");
        assert_eq!(keyboard.keyboard[1][0].text, "🏨 Hotels");
    }
}
