//! # Query Filters
//!
//! Typed filters handed to the persistence layer.
//!
//! Every field is optional but statically named: a store implementation
//! translates each `Some` into one predicate and ignores the `None`s. The
//! filters also know how to test a record in memory, which is what the
//! in-memory store uses and what the SQL repositories mirror.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Reservation, ReservationStatus, Table, WaitlistEntry, WaitlistStatus};

/// Filter over a restaurant's tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFilter {
    pub restaurant_id: String,
    /// Only tables with `is_active = true`.
    pub active_only: bool,
    /// Only tables seating at least this many guests.
    pub min_capacity: Option<i32>,
    pub section: Option<String>,
}

impl TableFilter {
    /// Active tables of a restaurant.
    pub fn active(restaurant_id: impl Into<String>) -> Self {
        TableFilter {
            restaurant_id: restaurant_id.into(),
            active_only: true,
            ..Default::default()
        }
    }

    pub fn with_min_capacity(mut self, capacity: i32) -> Self {
        self.min_capacity = Some(capacity);
        self
    }

    pub fn matches(&self, table: &Table) -> bool {
        table.restaurant_id == self.restaurant_id
            && (!self.active_only || table.is_active)
            && self.min_capacity.map_or(true, |min| table.capacity >= min)
            && self
                .section
                .as_ref()
                .map_or(true, |s| table.section.as_deref() == Some(s.as_str()))
    }
}

/// Filter over a restaurant's reservations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationFilter {
    pub restaurant_id: String,
    /// Exact date.
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on the date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the date.
    pub date_to: Option<NaiveDate>,
    /// Status must be one of these.
    pub status_in: Option<Vec<ReservationStatus>>,
    pub table_id: Option<String>,
    /// Only reservations without an assigned table.
    pub unassigned_only: bool,
    /// Leave this reservation out (update-in-place checks).
    pub exclude_id: Option<String>,
}

impl ReservationFilter {
    pub fn for_restaurant(restaurant_id: impl Into<String>) -> Self {
        ReservationFilter {
            restaurant_id: restaurant_id.into(),
            ..Default::default()
        }
    }

    /// Reservations holding a table on `date`.
    pub fn occupying(restaurant_id: impl Into<String>, date: NaiveDate) -> Self {
        Self::for_restaurant(restaurant_id)
            .on(date)
            .with_statuses(&ReservationStatus::OCCUPYING)
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn with_statuses(mut self, statuses: &[ReservationStatus]) -> Self {
        self.status_in = Some(statuses.to_vec());
        self
    }

    pub fn on_table(mut self, table_id: Option<String>) -> Self {
        self.table_id = table_id;
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned_only = true;
        self
    }

    pub fn excluding(mut self, reservation_id: Option<String>) -> Self {
        self.exclude_id = reservation_id;
        self
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        r.restaurant_id == self.restaurant_id
            && self.date.map_or(true, |d| r.date == d)
            && self.date_from.map_or(true, |d| r.date >= d)
            && self.date_to.map_or(true, |d| r.date <= d)
            && self
                .status_in
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&r.status))
            && self
                .table_id
                .as_ref()
                .map_or(true, |t| r.table_id.as_deref() == Some(t.as_str()))
            && (!self.unassigned_only || r.table_id.is_none())
            && self.exclude_id.as_ref().map_or(true, |id| &r.id != id)
    }
}

/// Filter over a restaurant's waitlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitlistFilter {
    pub restaurant_id: String,
    pub status_in: Option<Vec<WaitlistStatus>>,
}

impl WaitlistFilter {
    /// Entries currently WAITING.
    pub fn waiting(restaurant_id: impl Into<String>) -> Self {
        WaitlistFilter {
            restaurant_id: restaurant_id.into(),
            status_in: Some(vec![WaitlistStatus::Waiting]),
        }
    }

    pub fn with_statuses(restaurant_id: impl Into<String>, statuses: &[WaitlistStatus]) -> Self {
        WaitlistFilter {
            restaurant_id: restaurant_id.into(),
            status_in: Some(statuses.to_vec()),
        }
    }

    pub fn matches(&self, entry: &WaitlistEntry) -> bool {
        entry.restaurant_id == self.restaurant_id
            && self
                .status_in
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&entry.status))
    }
}
