//! Observability for the Game Provider.
//!
//! Bearer tokens and player identities never appear in logs; validation
//! outcomes are logged by error code only.

pub mod metrics;
