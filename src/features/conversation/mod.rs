pub mod models;
pub mod services;

pub use models::{InboundUpdate, Input, Reply, ReplyMarkup};
pub use services::{
    ChatNotifier, CheckoutService, ConversationController, PgSessionStore, SessionStore,
};
