//! # Error Types
//!
//! Domain-specific error types for seatwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  seatwise-core errors (this file)                                      │
//! │  ├── CoreError        - Business failures (not found, conflict, ...)   │
//! │  └── ValidationError  - Malformed input fields                         │
//! │                                                                         │
//! │  seatwise-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  seatwise-engine errors                                                │
//! │  └── EngineError      - What the routing layer sees                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → routing layer       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-rule violations found by [`crate::rules`] are *not* errors on
//! their own: the validator returns a report. They only become a
//! [`CoreError::RulesViolated`] when a write path refuses to proceed.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Restaurant does not exist or has been deactivated.
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    /// Table does not exist or belongs to another restaurant.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Reservation not found.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Waitlist entry not found.
    #[error("Waitlist entry not found: {0}")]
    WaitlistEntryNotFound(String),

    /// The request broke one or more business rules.
    ///
    /// Every violated rule is listed, never just the first.
    #[error("Reservation violates {} rule(s): {}", .0.len(), .0.join("; "))]
    RulesViolated(Vec<String>),

    /// The requested table/time is already booked.
    ///
    /// ## User Workflow
    /// ```text
    /// Book T1 at 19:30
    ///      │
    ///      ▼
    /// T1 holds 19:00-21:00 (+15 min turnover)
    ///      │
    ///      ▼
    /// Conflict { table_id: "T1", conflicting_ids: [...] }
    ///      │
    ///      ▼
    /// Caller re-queries availability around 19:30
    /// ```
    #[error("Table {table_id} is already booked ({} conflicting reservation(s))", .conflicting_ids.len())]
    Conflict {
        table_id: String,
        conflicting_ids: Vec<String>,
    },

    /// No active table is free and large enough for the party.
    #[error("No table available for a party of {party_size}")]
    NoTableAvailable { party_size: i32 },

    /// Reservation cannot move from its current status to the requested one.
    #[error("Reservation {id} is {from}, cannot become {to}")]
    InvalidReservationTransition { id: String, from: String, to: String },

    /// Waitlist entry cannot move from its current status to the requested one.
    #[error("Waitlist entry {id} is {from}, cannot become {to}")]
    InvalidWaitlistTransition { id: String, from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "referenced record is missing" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::RestaurantNotFound(_)
                | CoreError::TableNotFound(_)
                | CoreError::ReservationNotFound(_)
                | CoreError::WaitlistEntryNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request field is malformed, before any business rule
/// is consulted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
