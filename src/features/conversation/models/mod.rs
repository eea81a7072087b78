mod inbound;
mod reply;
mod service_option;
mod session;

pub use inbound::{InboundUpdate, Input};
pub use reply::{Reply, ReplyMarkup};
pub use service_option::{service_menu, ServiceOption, SERVICE_CATALOG};
pub use session::{ConversationSession, ConversationSessionRow, ConversationState};
