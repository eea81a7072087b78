mod chat_notifier;
mod checkout_service;
mod conversation_controller;
mod session_store;

pub use chat_notifier::ChatNotifier;
pub use checkout_service::CheckoutService;
pub use conversation_controller::ConversationController;
pub use session_store::{PgSessionStore, SessionStore};
