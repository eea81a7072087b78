//! Telegram transport: turns bot updates into controller input and controller
//! replies into messages.

pub mod commands;
pub mod dispatcher;
mod notifier;

pub use notifier::TelegramNotifier;
