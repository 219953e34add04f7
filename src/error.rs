//! Error type shared by all store modules.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the persistence and domain layers.
///
/// Validation failures carry a message suitable for showing to the
/// operator; they block the operation and are never fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("subscription expired on {active_until}")]
    SubscriptionExpired { active_until: DateTime<Utc> },

    #[error("database lock poisoned: {0}")]
    Lock(String),

    #[error("failed to open browser: {0}")]
    Browser(String),
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }
}
