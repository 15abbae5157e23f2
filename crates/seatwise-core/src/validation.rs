//! # Validation Module
//!
//! Input field checks for Seatwise requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Routing layer                                                │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (field shape)                                    │
//! │  ├── Names present and bounded                                         │
//! │  ├── Party size / priority / duration in range                         │
//! │  └── Email and id format                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: rules module (restaurant configuration)                      │
//! │  ├── Operating hours, booking window, blackout dates                   │
//! │  └── Restaurant-specific party/duration bounds                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite CHECK / FOREIGN KEY constraints)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use seatwise_core::validation::{validate_party_size, validate_priority};
//!
//! validate_party_size(4).unwrap();
//! assert!(validate_priority(11).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_PRIORITY, MINUTES_PER_DAY, MIN_PRIORITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted customer name.
pub const MAX_NAME_LEN: usize = 120;

/// Longest accepted notes / special requests text.
pub const MAX_NOTES_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 120 characters
///
/// ## Example
/// ```rust
/// use seatwise_core::validation::validate_customer_name;
///
/// assert!(validate_customer_name("Ada Lovelace").is_ok());
/// assert!(validate_customer_name("  ").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a free-text field such as notes or special requests.
pub fn validate_notes(field: &str, text: Option<&str>) -> ValidationResult<()> {
    match text {
        Some(t) if t.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates an optional email address.
///
/// Deliberately loose: one `@` with something on both sides and a dot in
/// the domain part.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "customer_email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a party size before any restaurant-specific bound is applied.
pub fn validate_party_size(party_size: i32) -> ValidationResult<()> {
    if party_size <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "party_size".to_string(),
        });
    }

    Ok(())
}

/// Validates a waitlist priority.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Host stand: add walk-in                                               │
/// │                                                                         │
/// │  Host picks priority 9 (regular guest)                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_priority(9) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── outside 1..=10? → Error                                      │
/// │       │                                                                 │
/// │       └── OK → enqueue, then reorder                                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_priority(priority: i32) -> ValidationResult<()> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(ValidationError::OutOfRange {
            field: "priority".to_string(),
            min: MIN_PRIORITY as i64,
            max: MAX_PRIORITY as i64,
        });
    }

    Ok(())
}

/// Validates a reservation duration before restaurant bounds are applied.
pub fn validate_duration(minutes: i32) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_minutes".to_string(),
        });
    }

    if minutes > MINUTES_PER_DAY {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            min: 1,
            max: MINUTES_PER_DAY as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use seatwise_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Grace").is_ok());
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("")).is_ok());
        assert!(validate_email(Some("guest@example.com")).is_ok());

        assert!(validate_email(Some("guest")).is_err());
        assert!(validate_email(Some("@example.com")).is_err());
        assert!(validate_email(Some("guest@example")).is_err());
        assert!(validate_email(Some("a@b@c.com")).is_err());
    }

    #[test]
    fn test_validate_priority() {
        assert!(validate_priority(1).is_ok());
        assert!(validate_priority(10).is_ok());
        assert!(validate_priority(0).is_err());
        assert!(validate_priority(11).is_err());
    }

    #[test]
    fn test_validate_party_and_duration() {
        assert!(validate_party_size(1).is_ok());
        assert!(validate_party_size(0).is_err());
        assert!(validate_duration(90).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MINUTES_PER_DAY + 1).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert!(validate_notes("notes", None).is_ok());
        assert!(validate_notes("notes", Some("window seat")).is_ok());
        assert!(validate_notes("notes", Some(&"x".repeat(1001))).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
