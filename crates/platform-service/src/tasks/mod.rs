//! Background tasks for the Game Platform.
//!
//! # Tasks
//!
//! - `session_sweeper` - Periodically drops expired sessions nobody looked up again

pub mod session_sweeper;

pub use session_sweeper::start_session_sweeper;
