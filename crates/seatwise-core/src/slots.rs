//! # Time-Slot Generator
//!
//! Cuts a day's opening hours into fixed-interval slots and reports, per
//! slot, how many tables could still take the party.
//!
//! ```text
//! open 17:00                                              close 22:00
//!   │  17:00  17:30  18:00  ...  19:30  20:00                  │
//!   │  ├──── 120 min ────┤                                     │
//!   │                              ├──── 120 min ────┤         │
//!   │  last slot starts at close - duration (20:00)            │
//! ```
//!
//! [`TimeSlots`] is lazy: each slot runs the availability check only when
//! the iterator is advanced.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::{evaluate, AvailabilityQuery};
use crate::policy::SchedulingPolicy;
use crate::types::{time_from_minutes, OperatingHours, Reservation, Table};
use crate::MINUTES_PER_DAY;

/// What the calendar view asks for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SlotRequest {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub party_size: i32,
    pub duration_minutes: i32,
    pub granularity_minutes: i32,
}

impl SlotRequest {
    /// Request using the policy's default duration and granularity.
    pub fn with_defaults(date: NaiveDate, party_size: i32, policy: &SchedulingPolicy) -> Self {
        SlotRequest {
            date,
            party_size,
            duration_minutes: policy.default_slot_duration_minutes,
            granularity_minutes: policy.slot_granularity_minutes,
        }
    }
}

/// One bookable start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeSlot {
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub is_available: bool,
    pub available_table_count: usize,
    pub total_available_capacity: i32,
}

/// Lazy, finite sequence of slots for one day.
#[derive(Debug, Clone)]
pub struct TimeSlots<'a> {
    tables: &'a [Table],
    reservations: &'a [Reservation],
    policy: &'a SchedulingPolicy,
    request: SlotRequest,
    next_start: i32,
    last_start: i32,
}

impl<'a> TimeSlots<'a> {
    /// Slots for `request.date` within `hours`.
    ///
    /// A closed day, a missing hours record or a non-positive granularity
    /// yields an empty sequence. Start times stop at midnight.
    pub fn new(
        hours: Option<&OperatingHours>,
        tables: &'a [Table],
        reservations: &'a [Reservation],
        request: SlotRequest,
        policy: &'a SchedulingPolicy,
    ) -> Self {
        let (next_start, last_start) = match hours {
            Some(h) if h.is_open && request.granularity_minutes > 0 => (
                h.open_time,
                (h.close_time - request.duration_minutes).min(MINUTES_PER_DAY - 1),
            ),
            _ => (0, -1),
        };

        TimeSlots {
            tables,
            reservations,
            policy,
            request,
            next_start,
            last_start,
        }
    }

    fn remaining(&self) -> usize {
        if self.next_start > self.last_start {
            0
        } else {
            ((self.last_start - self.next_start) / self.request.granularity_minutes + 1) as usize
        }
    }
}

impl Iterator for TimeSlots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        if self.next_start > self.last_start {
            return None;
        }

        let time = time_from_minutes(self.next_start);
        self.next_start += self.request.granularity_minutes;

        let query = AvailabilityQuery::new(
            self.request.date,
            time,
            self.request.duration_minutes,
            self.request.party_size,
        );
        let report = evaluate(self.tables, self.reservations, &query, self.policy);

        Some(TimeSlot {
            time,
            is_available: report.is_available,
            available_table_count: report.available_tables.len(),
            total_available_capacity: report.total_capacity(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for TimeSlots<'_> {}

/// Seats a slot could offer the party if nothing were booked.
pub fn eligible_capacity(tables: &[Table], party_size: i32) -> i32 {
    tables
        .iter()
        .filter(|t| t.is_active && t.seats(party_size))
        .map(|t| t.capacity)
        .sum()
}
