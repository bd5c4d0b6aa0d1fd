//! HTTP request handlers for the Game Platform.

pub mod auth_handler;
pub mod health;
pub mod jwks_handler;
pub mod metrics;
pub mod token_handler;

pub use auth_handler::{handle_login, handle_logout};
pub use health::health_check;
pub use jwks_handler::handle_get_jwks;
pub use metrics::metrics_handler;
pub use token_handler::handle_issue_token;
