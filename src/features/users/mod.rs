//! User profiles keyed by chat identity.
//!
//! Profiles are created on first contact with the language negotiated from the
//! client's locale, and `last_active` is refreshed on every interaction.

pub mod models;
pub mod services;

pub use models::UserProfile;
pub use services::{PgUserStore, UserProfileService, UserStore};
