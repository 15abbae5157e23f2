//! # Availability Module
//!
//! Decides whether a table (or any suitable table) is free for a window.
//!
//! ## Padded Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Existing A: 19:00 ─────────────── 21:00                               │
//! │                                                                         │
//! │  Request B: 19:30 ── 20:30       padded 19:15 ───── 20:45   CONFLICT   │
//! │  Request C:               21:20 ── 22:20                               │
//! │                   padded 21:05 ───────────── 22:35          FREE       │
//! │                                                                         │
//! │  A request is padded by the turnover buffer on both sides and tested   │
//! │  against the raw window of each booking holding the table:              │
//! │                                                                         │
//! │      conflict ⇔ existing.start < padded.end && existing.end > padded.start
//! │                                                                         │
//! │  Half-open: existing.end == padded.start is NOT a conflict.            │
//! │  The relation is symmetric, so every pair of accepted bookings on a    │
//! │  table stays at least one buffer apart.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::policy::SchedulingPolicy;
use crate::types::{minute_of_day, Reservation, Table};

// =============================================================================
// Time Window
// =============================================================================

/// A half-open `[start, end)` window in minutes from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeWindow {
    pub start: i32,
    pub end: i32,
}

impl TimeWindow {
    pub const fn new(start: i32, end: i32) -> Self {
        TimeWindow { start, end }
    }

    /// Window of `duration_minutes` starting at `time`.
    pub fn starting_at(time: NaiveTime, duration_minutes: i32) -> Self {
        let start = minute_of_day(time);
        TimeWindow::new(start, start + duration_minutes)
    }

    /// Window grown by `buffer` minutes on both ends.
    #[inline]
    pub const fn padded(&self, buffer: i32) -> Self {
        TimeWindow::new(self.start - buffer, self.end + buffer)
    }

    /// Half-open intersection test.
    #[inline]
    pub const fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub const fn duration(&self) -> i32 {
        self.end - self.start
    }
}

// =============================================================================
// Conflict Detection
// =============================================================================

/// Bookings on `table_id` that collide with `requested` once padded.
///
/// Only reservations that hold a table (confirmed, arrived, seated) count.
/// `exclude_id` skips the reservation being moved in an update-in-place.
pub fn find_conflicts<'a, I>(
    table_id: &str,
    requested: TimeWindow,
    buffer_minutes: i32,
    existing: I,
    exclude_id: Option<&str>,
) -> Vec<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    let padded = requested.padded(buffer_minutes);

    existing
        .into_iter()
        .filter(|r| r.status.occupies_table())
        .filter(|r| r.table_id.as_deref() == Some(table_id))
        .filter(|r| exclude_id.map_or(true, |id| r.id != id))
        .filter(|r| r.window().overlaps(&padded))
        .collect()
}

/// Result of a store-side "check then insert" for a reservation.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// The reservation was written.
    Booked,
    /// Nothing was written; these bookings hold the window.
    Conflicted(Vec<Reservation>),
}

impl BookingOutcome {
    /// Runs the conflict check for a reservation about to be written.
    ///
    /// Unassigned or finished reservations never conflict.
    pub fn check(candidate: &Reservation, buffer_minutes: i32, existing: &[Reservation]) -> Self {
        let table_id = match candidate.table_id.as_deref() {
            Some(id) if !candidate.status.is_terminal() => id,
            _ => return BookingOutcome::Booked,
        };

        let conflicts = find_conflicts(
            table_id,
            candidate.window(),
            buffer_minutes,
            existing.iter().filter(|r| r.date == candidate.date),
            Some(candidate.id.as_str()),
        );

        if conflicts.is_empty() {
            BookingOutcome::Booked
        } else {
            BookingOutcome::Conflicted(conflicts.into_iter().cloned().collect())
        }
    }

    pub fn is_booked(&self) -> bool {
        matches!(self, BookingOutcome::Booked)
    }
}

// =============================================================================
// Availability Query
// =============================================================================

/// What the caller wants to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailabilityQuery {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub party_size: i32,
    /// Check one specific table instead of the whole floor.
    pub table_id: Option<String>,
    /// Ignore this reservation (it is the one being moved).
    pub exclude_reservation_id: Option<String>,
}

impl AvailabilityQuery {
    pub fn new(date: NaiveDate, time: NaiveTime, duration_minutes: i32, party_size: i32) -> Self {
        AvailabilityQuery {
            date,
            time,
            duration_minutes,
            party_size,
            table_id: None,
            exclude_reservation_id: None,
        }
    }

    pub fn on_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn excluding(mut self, reservation_id: impl Into<String>) -> Self {
        self.exclude_reservation_id = Some(reservation_id.into());
        self
    }

    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.time, self.duration_minutes)
    }
}

/// A free table, flagged when its size suits the party well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableTable {
    #[serde(flatten)]
    #[ts(flatten)]
    pub table: Table,
    /// Capacity is within `[party_size, party_size + slack]`.
    pub is_optimal: bool,
}

/// Availability answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailabilityReport {
    pub is_available: bool,
    /// Free tables in capacity order.
    pub available_tables: Vec<AvailableTable>,
    /// Bookings blocking the requested table (specific-table queries only).
    pub conflicts: Vec<Reservation>,
}

impl AvailabilityReport {
    /// Tables only, in capacity order.
    pub fn tables(&self) -> Vec<Table> {
        self.available_tables.iter().map(|t| t.table.clone()).collect()
    }

    /// Sum of seats over all free tables.
    pub fn total_capacity(&self) -> i32 {
        self.available_tables.iter().map(|t| t.table.capacity).sum()
    }
}

/// Evaluates a query against already-loaded tables and reservations.
///
/// ## Arguments
/// * `tables` - Candidate tables. For a specific-table query this is the
///   requested table; otherwise the restaurant's tables (inactive or too
///   small ones are skipped here).
/// * `reservations` - Reservations of the same restaurant and date.
pub fn evaluate(
    tables: &[Table],
    reservations: &[Reservation],
    query: &AvailabilityQuery,
    policy: &SchedulingPolicy,
) -> AvailabilityReport {
    let window = query.window();
    let buffer = policy.turnover_buffer_minutes;
    let exclude = query.exclude_reservation_id.as_deref();
    let date = query.date;
    let same_day = move || reservations.iter().filter(move |r| r.date == date);

    let is_optimal = |table: &Table| {
        table.capacity >= query.party_size
            && table.capacity <= query.party_size + policy.optimal_fit_slack
    };

    if let Some(table_id) = query.table_id.as_deref() {
        let conflicts: Vec<Reservation> = find_conflicts(table_id, window, buffer, same_day(), exclude)
            .into_iter()
            .cloned()
            .collect();

        let available_tables = if conflicts.is_empty() {
            tables
                .iter()
                .filter(|t| t.id == table_id)
                .map(|t| AvailableTable {
                    table: t.clone(),
                    is_optimal: is_optimal(t),
                })
                .collect()
        } else {
            Vec::new()
        };

        return AvailabilityReport {
            is_available: conflicts.is_empty(),
            available_tables,
            conflicts,
        };
    }

    let mut available_tables: Vec<AvailableTable> = tables
        .iter()
        .filter(|t| t.is_active && t.seats(query.party_size))
        .filter(|t| find_conflicts(&t.id, window, buffer, same_day(), exclude).is_empty())
        .map(|t| AvailableTable {
            table: t.clone(),
            is_optimal: is_optimal(t),
        })
        .collect();

    available_tables.sort_by(|a, b| {
        a.table
            .capacity
            .cmp(&b.table.capacity)
            .then_with(|| a.table.table_number.cmp(&b.table.table_number))
    });

    AvailabilityReport {
        is_available: !available_tables.is_empty(),
        available_tables,
        conflicts: Vec::new(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{ReservationStatus, TableShape};
    use chrono::Utc;
    use proptest::prelude::*;

    pub(crate) fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()
    }

    pub(crate) fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub(crate) fn table(id: &str, capacity: i32) -> Table {
        Table {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            table_number: id.to_string(),
            capacity,
            section: None,
            shape: TableShape::Square,
            pos_x: 0.0,
            pos_y: 0.0,
            width: 1.0,
            height: 1.0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn booking(id: &str, table_id: Option<&str>, time: NaiveTime, duration: i32) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            table_id: table_id.map(str::to_string),
            waitlist_entry_id: None,
            customer_name: "Guest".to_string(),
            customer_phone: None,
            customer_email: None,
            party_size: 2,
            date: date(),
            time,
            duration_minutes: duration,
            status: ReservationStatus::Confirmed,
            special_requests: None,
            created_at: now,
            updated_at: now,
            confirmed_at: Some(now),
            arrived_at: None,
            seated_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_dinner_scenario() {
        let tables = vec![table("T1", 2)];
        let existing = vec![booking("A", Some("T1"), hm(19, 0), 120)];
        let policy = SchedulingPolicy::default();

        let b = AvailabilityQuery::new(date(), hm(19, 30), 60, 2).on_table("T1");
        let report = evaluate(&tables, &existing, &b, &policy);
        assert!(!report.is_available);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].id, "A");

        let c = AvailabilityQuery::new(date(), hm(21, 20), 60, 2).on_table("T1");
        let report = evaluate(&tables, &existing, &c, &policy);
        assert!(report.is_available);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.available_tables.len(), 1);
    }

    #[test]
    fn test_boundary_is_half_open() {
        let existing = vec![booking("A", Some("T1"), hm(19, 0), 120)];

        // Existing ends 21:00; request at 21:15 pads back to exactly 21:00.
        let touching = TimeWindow::starting_at(hm(21, 15), 60);
        assert!(find_conflicts("T1", touching, 15, &existing, None).is_empty());

        let one_minute_early = TimeWindow::starting_at(hm(21, 14), 60);
        assert_eq!(find_conflicts("T1", one_minute_early, 15, &existing, None).len(), 1);
    }

    #[test]
    fn test_inactive_statuses_do_not_conflict() {
        let mut cancelled = booking("A", Some("T1"), hm(19, 0), 120);
        cancelled.status = ReservationStatus::Cancelled;
        let mut pending = booking("B", Some("T1"), hm(19, 0), 120);
        pending.status = ReservationStatus::Pending;

        let window = TimeWindow::starting_at(hm(19, 0), 60);
        assert!(find_conflicts("T1", window, 15, &[cancelled, pending], None).is_empty());
    }

    #[test]
    fn test_exclude_reservation_for_update() {
        let existing = vec![booking("A", Some("T1"), hm(19, 0), 120)];
        let window = TimeWindow::starting_at(hm(19, 30), 120);
        assert!(find_conflicts("T1", window, 15, &existing, Some("A")).is_empty());
    }

    #[test]
    fn test_any_table_flags_optimal() {
        let tables = vec![table("T2", 2), table("T6", 6), table("T4", 4), table("T10", 10)];
        let existing = vec![booking("A", Some("T4"), hm(19, 0), 120)];
        let query = AvailabilityQuery::new(date(), hm(19, 30), 90, 4);

        let report = evaluate(&tables, &existing, &query, &SchedulingPolicy::default());
        let ids: Vec<&str> = report.available_tables.iter().map(|t| t.table.id.as_str()).collect();
        assert_eq!(ids, vec!["T6", "T10"]);
        assert!(report.available_tables[0].is_optimal);
        assert!(!report.available_tables[1].is_optimal);
        assert_eq!(report.total_capacity(), 16);
    }

    #[test]
    fn test_no_active_tables() {
        let mut t = table("T1", 4);
        t.is_active = false;
        let query = AvailabilityQuery::new(date(), hm(19, 0), 60, 2);
        let report = evaluate(&[t], &[], &query, &SchedulingPolicy::default());
        assert!(!report.is_available);
        assert!(report.available_tables.is_empty());
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_booking_outcome_ignores_other_dates() {
        let mut other_day = booking("A", Some("T1"), hm(19, 0), 120);
        other_day.date = date().succ_opt().unwrap();
        let candidate = booking("B", Some("T1"), hm(19, 0), 120);
        assert!(BookingOutcome::check(&candidate, 15, &[other_day]).is_booked());
    }

    proptest! {
        /// Accepting bookings greedily through the conflict check never lets
        /// two bookings on one table come within a buffer of each other.
        #[test]
        fn prop_no_double_booking(
            requests in prop::collection::vec((0i32..1380, 15i32..240), 1..40),
            buffer in 0i32..30,
        ) {
            let mut accepted: Vec<Reservation> = Vec::new();

            for (i, (start, duration)) in requests.into_iter().enumerate() {
                let time = crate::types::time_from_minutes(start);
                let candidate = booking(&format!("r{i}"), Some("T1"), time, duration);
                if BookingOutcome::check(&candidate, buffer, &accepted).is_booked() {
                    accepted.push(candidate);
                }
            }

            for (i, a) in accepted.iter().enumerate() {
                for b in accepted.iter().skip(i + 1) {
                    prop_assert!(!a.window().padded(buffer).overlaps(&b.window()));
                    prop_assert!(!b.window().padded(buffer).overlaps(&a.window()));
                }
            }
        }
    }
}
