//! # Engine Error Types
//!
//! What callers of the engine see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐ │
//! │  │  Request         │  │  Scheduling      │  │  Infrastructure      │ │
//! │  │                  │  │                  │  │                      │ │
//! │  │  ValidationFailed│  │  Conflict        │  │  Store               │ │
//! │  │  Core(Validation)│  │  Core(NoTable..) │  │  DeadlineExceeded    │ │
//! │  │  Core(NotFound)  │  │  Core(Invalid..) │  │  Config              │ │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘ │
//! │                                                                         │
//! │  Only the infrastructure column is unexpected; everything else is a    │
//! │  normal answer the routing layer turns into a 4xx.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use seatwise_core::rules::RuleViolation;
use seatwise_core::{CoreError, Reservation};

use crate::store::StoreError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business failure from seatwise-core (not found, invalid transition,
    /// no table, malformed field).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request broke business rules. Every violated rule is listed.
    #[error("Reservation violates {} rule(s): {}", .errors.len(), .errors.join("; "))]
    ValidationFailed {
        errors: Vec<String>,
        violations: Vec<RuleViolation>,
    },

    /// The table is already held for the padded window.
    #[error("Table {table_id} is already booked ({} conflicting reservation(s))", .conflicts.len())]
    Conflict {
        table_id: String,
        conflicts: Vec<Reservation>,
    },

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The caller's deadline passed while waiting on the store.
    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// True when the referenced record does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::Core(e) => e.is_not_found(),
            EngineError::Store(StoreError::NotFound { .. }) => true,
            _ => false,
        }
    }

    /// True for failures the caller did not cause.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            EngineError::Store(StoreError::Backend(_)) | EngineError::DeadlineExceeded { .. }
        )
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<seatwise_db::DbError> for EngineError {
    fn from(err: seatwise_db::DbError) -> Self {
        EngineError::Store(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_rules() {
        let err = EngineError::ValidationFailed {
            errors: vec!["Cannot make reservations for past dates".into(), "Table not found".into()],
            violations: vec![RuleViolation::DateInPast, RuleViolation::TableNotFound],
        };
        assert_eq!(
            err.to_string(),
            "Reservation violates 2 rule(s): Cannot make reservations for past dates; Table not found"
        );
        assert!(!err.is_unexpected());
    }

    #[test]
    fn test_categories() {
        let missing = EngineError::from(CoreError::ReservationNotFound("r1".into()));
        assert!(missing.is_not_found());

        let store_missing = EngineError::Store(StoreError::not_found("Table", "t1"));
        assert!(store_missing.is_not_found());

        let deadline = EngineError::DeadlineExceeded { operation: "tables" };
        assert!(deadline.is_unexpected());
        assert_eq!(deadline.to_string(), "Deadline exceeded during tables");
    }
}
