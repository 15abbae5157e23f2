//! # seatwise-core: Pure Scheduling Logic for Seatwise
//!
//! This crate is the **heart** of Seatwise. It decides whether a party fits
//! at a time, which table it should get, and where a waiting party stands in
//! line. Everything here is a pure function over already-loaded records.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Seatwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Routing layer (HTTP, auth, push)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    seatwise-engine                              │   │
//! │  │    ReservationService, WaitlistService, ScheduleService         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ seatwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   rules   │  │availability│  │ assignment │  │ waitlist │  │   │
//! │  │   │ validator │  │  windows   │  │  scoring   │  │ ordering │  │   │
//! │  │   └───────────┘  └────────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  seatwise-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Restaurant, Table, Reservation, WaitlistEntry)
//! - [`filter`] - Typed query filters handed to the store
//! - [`policy`] - Tunable scheduling and waitlist parameters
//! - [`validation`] - Input field checks
//! - [`rules`] - Business-rule validator
//! - [`availability`] - Padded windows and conflict detection
//! - [`assignment`] - Table-assignment optimizer
//! - [`slots`] - Time-slot generator
//! - [`reports`] - Day/week rollups and peak hours
//! - [`waitlist`] - Wait estimates and position ordering
//! - [`events`] - Domain events for the push transport
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveTime;
//! use seatwise_core::availability::TimeWindow;
//!
//! let dinner = TimeWindow::starting_at(NaiveTime::from_hms_opt(19, 0, 0).unwrap(), 120);
//! let late = TimeWindow::starting_at(NaiveTime::from_hms_opt(21, 20, 0).unwrap(), 60);
//!
//! // 21:20 is outside 18:45-21:15, so the tables can turn over in time
//! assert!(!dinner.padded(15).overlaps(&late));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod assignment;
pub mod availability;
pub mod error;
pub mod events;
pub mod filter;
pub mod policy;
pub mod reports;
pub mod rules;
pub mod slots;
pub mod types;
pub mod validation;
pub mod waitlist;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use policy::{SchedulingPolicy, WaitlistPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minutes a table needs between two parties.
pub const DEFAULT_TURNOVER_BUFFER_MINUTES: i32 = 15;

/// Upper bound on any waitlist estimate.
pub const DEFAULT_MAX_WAIT_MINUTES: i32 = 240;

/// Turnover assumed when a restaurant has no completed history at all.
pub const DEFAULT_TURNOVER_MINUTES: i32 = 120;

/// Length of a slot checked by the time-slot generator.
pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 120;

/// Distance between two consecutive slot start times.
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: i32 = 30;

/// Waitlist priority bounds (inclusive).
pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 10;

/// Minutes in one day, used for minute-of-day arithmetic.
pub const MINUTES_PER_DAY: i32 = 24 * 60;
