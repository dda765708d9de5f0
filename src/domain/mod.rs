//! Domain layer - core types and error taxonomy.
//!
//! This layer contains the user record, the notifier seam and the error
//! types, without any external dependencies (DB, IO, etc.).

pub mod error;
pub mod models;
pub mod settings;

pub use error::{AppError, Result};
pub use models::{FailureNotifier, UserRecord, SECRET_MASK};
pub use settings::AppConfig;
