//! # Scheduling Policy
//!
//! Tunable parameters for the scheduling algorithms.
//!
//! Both structs deserialize with per-field defaults, so the engine can embed
//! them directly as `[scheduling]` and `[waitlist]` sections of its TOML
//! configuration and a partial file still yields the documented values.

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_MAX_WAIT_MINUTES, DEFAULT_SLOT_DURATION_MINUTES, DEFAULT_SLOT_GRANULARITY_MINUTES,
    DEFAULT_TURNOVER_BUFFER_MINUTES, DEFAULT_TURNOVER_MINUTES,
};

/// Parameters for availability, assignment and slot generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Turnover buffer applied on both sides of a requested window.
    pub turnover_buffer_minutes: i32,

    /// A table is flagged optimal when `capacity <= party_size + slack`.
    pub optimal_fit_slack: i32,

    /// Seats a future party may leave empty before a table counts as blocked.
    pub future_party_slack: i32,

    /// Weight of the candidate's own empty seats in the future-impact score.
    pub waste_weight: f64,

    /// Distance between generated slot start times.
    pub slot_granularity_minutes: i32,

    /// Duration checked by the slot generator when the caller gives none.
    pub default_slot_duration_minutes: i32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        SchedulingPolicy {
            turnover_buffer_minutes: DEFAULT_TURNOVER_BUFFER_MINUTES,
            optimal_fit_slack: 2,
            future_party_slack: 2,
            waste_weight: 0.5,
            slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            default_slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
        }
    }
}

/// Parameters for waitlist estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlistPolicy {
    /// Cap on any estimate.
    pub max_wait_minutes: i32,

    /// Turnover used when neither seated/completed pairs nor durations exist.
    pub default_turnover_minutes: i32,

    /// Trailing window of completed reservations used for turnover.
    pub turnover_lookback_days: i64,

    /// Parties within this many seats count as "similar".
    pub similar_party_tolerance: i32,
}

impl Default for WaitlistPolicy {
    fn default() -> Self {
        WaitlistPolicy {
            max_wait_minutes: DEFAULT_MAX_WAIT_MINUTES,
            default_turnover_minutes: DEFAULT_TURNOVER_MINUTES,
            turnover_lookback_days: 7,
            similar_party_tolerance: 2,
        }
    }
}
