//! Application layer - use cases and orchestration.
//!
//! This layer wires the credential store, the console and the SVN process
//! into the flows the CLI exposes.

pub mod accounts;
pub mod auth_cache;

pub use auth_cache::AuthCacheReset;
