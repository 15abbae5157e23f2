//! # Domain Events
//!
//! What happened, for whoever pushes updates to floor staff.
//!
//! Events carry full records so a subscriber never has to read back from
//! the store. The engine publishes them after the write has committed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Reservation, ReservationStatus, WaitlistEntry};
use crate::waitlist::PositionUpdate;

/// A state change in one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    ReservationCreated(Reservation),
    ReservationUpdated(Reservation),
    ReservationStatusChanged {
        reservation: Reservation,
        from: ReservationStatus,
    },
    ReservationDeleted {
        restaurant_id: String,
        reservation_id: String,
        #[ts(as = "String")]
        date: NaiveDate,
    },
    WaitlistEntryAdded(WaitlistEntry),
    WaitlistEntryUpdated(WaitlistEntry),
    WaitlistEntryNotified(WaitlistEntry),
    WaitlistEntryPromoted {
        entry: WaitlistEntry,
        reservation: Reservation,
    },
    WaitlistReordered {
        restaurant_id: String,
        positions: Vec<PositionUpdate>,
    },
}

impl DomainEvent {
    /// Restaurant the event belongs to, for per-restaurant fan-out.
    pub fn restaurant_id(&self) -> &str {
        match self {
            DomainEvent::ReservationCreated(r) | DomainEvent::ReservationUpdated(r) => &r.restaurant_id,
            DomainEvent::ReservationStatusChanged { reservation, .. } => &reservation.restaurant_id,
            DomainEvent::ReservationDeleted { restaurant_id, .. } => restaurant_id,
            DomainEvent::WaitlistEntryAdded(e)
            | DomainEvent::WaitlistEntryUpdated(e)
            | DomainEvent::WaitlistEntryNotified(e) => &e.restaurant_id,
            DomainEvent::WaitlistEntryPromoted { entry, .. } => &entry.restaurant_id,
            DomainEvent::WaitlistReordered { restaurant_id, .. } => restaurant_id,
        }
    }

    /// Stable name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ReservationCreated(_) => "reservation_created",
            DomainEvent::ReservationUpdated(_) => "reservation_updated",
            DomainEvent::ReservationStatusChanged { .. } => "reservation_status_changed",
            DomainEvent::ReservationDeleted { .. } => "reservation_deleted",
            DomainEvent::WaitlistEntryAdded(_) => "waitlist_entry_added",
            DomainEvent::WaitlistEntryUpdated(_) => "waitlist_entry_updated",
            DomainEvent::WaitlistEntryNotified(_) => "waitlist_entry_notified",
            DomainEvent::WaitlistEntryPromoted { .. } => "waitlist_entry_promoted",
            DomainEvent::WaitlistReordered { .. } => "waitlist_reordered",
        }
    }
}
