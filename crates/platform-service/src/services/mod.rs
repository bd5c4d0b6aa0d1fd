//! Business logic for the Game Platform.

pub mod session_store;
pub mod token_service;
pub mod user_service;

pub use session_store::{Session, SessionStore};
pub use token_service::TokenIssuer;
pub use user_service::UserStore;
