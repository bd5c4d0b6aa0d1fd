//! HTTP request handlers for the Game Provider.

pub mod health;
pub mod metrics;
pub mod play;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use play::handle_play;
