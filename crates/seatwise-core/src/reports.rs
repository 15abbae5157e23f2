//! # Reports
//!
//! Day and week rollups over generated slots, and peak-hour ranking.
//!
//! Utilization of a slot is the share of eligible seats (active tables that
//! fit the party) that are already taken:
//!
//! ```text
//! utilization = (eligible - available) / eligible × 100
//! ```
//!
//! A restaurant with no eligible seats reports 0% rather than dividing by
//! zero.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::slots::TimeSlot;
use crate::types::{Reservation, ReservationStatus};

/// Rollup for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DaySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub is_open: bool,
    pub slot_count: usize,
    pub available_slot_count: usize,
    /// Free seats summed over all slots.
    pub total_available_capacity: i32,
    pub utilization_percent: f64,
    /// Reservations that were not cancelled and did show up (or still may).
    pub reservation_count: usize,
    /// Guests across those reservations.
    pub covers: i32,
}

/// Rollup for seven consecutive days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeekSummary {
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_reservations: usize,
    pub total_covers: i32,
    /// Mean over open days only.
    pub average_utilization_percent: f64,
    /// Open day with the highest utilization (earliest on ties).
    #[ts(as = "Option<String>")]
    pub busiest_day: Option<NaiveDate>,
}

/// One clock hour of a day, ranked by how full it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeakHour {
    /// 0-23.
    pub hour: u32,
    pub slot_count: usize,
    pub utilization_percent: f64,
    pub total_available_capacity: i32,
}

/// Share of `eligible` seats not in `available`, as a percentage.
pub fn utilization_percent(eligible: i64, available: i64) -> f64 {
    if eligible <= 0 {
        return 0.0;
    }
    let taken = (eligible - available).clamp(0, eligible);
    taken as f64 * 100.0 / eligible as f64
}

/// Whether a reservation counts toward covers.
fn counts_as_cover(r: &Reservation) -> bool {
    !matches!(r.status, ReservationStatus::Cancelled | ReservationStatus::NoShow)
}

/// Builds the summary of one day from its slots.
///
/// `eligible_capacity` is the seat count of the tables that could host the
/// party in any single slot.
pub fn summarize_day(
    date: NaiveDate,
    is_open: bool,
    slots: &[TimeSlot],
    eligible_capacity: i32,
    reservations: &[Reservation],
) -> DaySummary {
    let total_available_capacity: i32 = slots.iter().map(|s| s.total_available_capacity).sum();
    let eligible_total = eligible_capacity as i64 * slots.len() as i64;

    let booked: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.date == date && counts_as_cover(r))
        .collect();

    DaySummary {
        date,
        is_open,
        slot_count: slots.len(),
        available_slot_count: slots.iter().filter(|s| s.is_available).count(),
        total_available_capacity,
        utilization_percent: utilization_percent(eligible_total, total_available_capacity as i64),
        reservation_count: booked.len(),
        covers: booked.iter().map(|r| r.party_size).sum(),
    }
}

/// Rolls seven (or however many) day summaries into a week.
pub fn summarize_week(start_date: NaiveDate, days: Vec<DaySummary>) -> WeekSummary {
    let open: Vec<&DaySummary> = days.iter().filter(|d| d.is_open && d.slot_count > 0).collect();

    let average_utilization_percent = if open.is_empty() {
        0.0
    } else {
        open.iter().map(|d| d.utilization_percent).sum::<f64>() / open.len() as f64
    };

    let mut busiest: Option<&DaySummary> = None;
    for day in &open {
        if busiest.map_or(true, |b| day.utilization_percent > b.utilization_percent) {
            busiest = Some(day);
        }
    }

    WeekSummary {
        start_date,
        total_reservations: days.iter().map(|d| d.reservation_count).sum(),
        total_covers: days.iter().map(|d| d.covers).sum(),
        average_utilization_percent,
        busiest_day: busiest.map(|d| d.date),
        days,
    }
}

/// Groups slots by clock hour and ranks the hours, busiest first.
///
/// Ties keep the earlier hour first.
pub fn rank_peak_hours(slots: &[TimeSlot], eligible_capacity: i32) -> Vec<PeakHour> {
    let mut by_hour: BTreeMap<u32, (usize, i32)> = BTreeMap::new();
    for slot in slots {
        let entry = by_hour.entry(slot.time.hour()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += slot.total_available_capacity;
    }

    let mut hours: Vec<PeakHour> = by_hour
        .into_iter()
        .map(|(hour, (slot_count, available))| PeakHour {
            hour,
            slot_count,
            utilization_percent: utilization_percent(
                eligible_capacity as i64 * slot_count as i64,
                available as i64,
            ),
            total_available_capacity: available,
        })
        .collect();

    // Stable sort keeps ascending hour order among equals.
    hours.sort_by(|a, b| b.utilization_percent.total_cmp(&a.utilization_percent));
    hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::tests::{booking, date, hm};

    fn slot(h: u32, m: u32, available_capacity: i32) -> TimeSlot {
        TimeSlot {
            time: hm(h, m),
            is_available: available_capacity > 0,
            available_table_count: (available_capacity / 2) as usize,
            total_available_capacity: available_capacity,
        }
    }

    #[test]
    fn test_utilization_guards_zero_capacity() {
        assert_eq!(utilization_percent(0, 0), 0.0);
        assert_eq!(utilization_percent(10, 10), 0.0);
        assert_eq!(utilization_percent(10, 0), 100.0);
        assert_eq!(utilization_percent(8, 6), 25.0);
    }

    #[test]
    fn test_summarize_day() {
        let slots = vec![slot(17, 0, 8), slot(18, 0, 4), slot(19, 0, 0), slot(20, 0, 4)];
        let mut cancelled = booking("c", Some("T2"), hm(20, 0), 60);
        cancelled.status = ReservationStatus::Cancelled;
        let mut big = booking("b", Some("T1"), hm(19, 0), 120);
        big.party_size = 6;
        let reservations = vec![booking("a", Some("T1"), hm(18, 0), 60), big, cancelled];

        let summary = summarize_day(date(), true, &slots, 8, &reservations);
        assert_eq!(summary.slot_count, 4);
        assert_eq!(summary.available_slot_count, 3);
        assert_eq!(summary.total_available_capacity, 16);
        assert_eq!(summary.utilization_percent, 50.0);
        assert_eq!(summary.reservation_count, 2);
        assert_eq!(summary.covers, 8);
    }

    #[test]
    fn test_summarize_week_picks_busiest_open_day() {
        let day = |offset: i64, is_open: bool, util: f64| DaySummary {
            date: date() + chrono::Duration::days(offset),
            is_open,
            slot_count: if is_open { 4 } else { 0 },
            available_slot_count: 0,
            total_available_capacity: 0,
            utilization_percent: util,
            reservation_count: 2,
            covers: 5,
        };
        let week = summarize_week(
            date(),
            vec![day(0, true, 20.0), day(1, false, 0.0), day(2, true, 60.0), day(3, true, 60.0)],
        );

        assert_eq!(week.busiest_day, Some(date() + chrono::Duration::days(2)));
        assert_eq!(week.total_reservations, 8);
        assert_eq!(week.total_covers, 20);
        assert!((week.average_utilization_percent - 140.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_peak_hours_ranked_by_utilization() {
        let slots = vec![
            slot(17, 0, 8),
            slot(17, 30, 8),
            slot(19, 0, 0),
            slot(19, 30, 4),
            slot(18, 0, 4),
            slot(18, 30, 4),
        ];
        let ranked = rank_peak_hours(&slots, 8);
        let order: Vec<u32> = ranked.iter().map(|h| h.hour).collect();
        assert_eq!(order, vec![19, 18, 17]);
        assert_eq!(ranked[0].utilization_percent, 75.0);
        assert_eq!(ranked[2].utilization_percent, 0.0);
    }
}
