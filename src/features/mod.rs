pub mod conversation;
pub mod payments;
pub mod rate_limits;
pub mod telegram;
pub mod transactions;
pub mod users;
pub mod webhooks;
