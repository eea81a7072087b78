mod user_profile_service;
mod user_store;

pub use user_profile_service::UserProfileService;
pub use user_store::{PgUserStore, UserStore};
