//! Observability for the Game Platform.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields.
//! Session ids, passwords and issued tokens never appear in logs.

pub mod metrics;
