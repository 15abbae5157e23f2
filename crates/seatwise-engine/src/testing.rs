//! Fixtures shared by the engine's unit tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::mpsc;

use seatwise_core::events::DomainEvent;
use seatwise_core::{
    OperatingHours, Reservation, ReservationStatus, Restaurant, RestaurantProfile, RestaurantSettings, Table,
    TableShape, WaitlistEntry, WaitlistStatus,
};

use crate::config::EngineConfig;
use crate::context::FixedClock;
use crate::store::MemoryStore;
use crate::Engine;

pub(crate) const RESTAURANT: &str = "r1";

/// Tuesday 2026-10-20, noon UTC.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap()
}

pub(crate) fn clock() -> FixedClock {
    FixedClock(now())
}

pub(crate) fn today() -> NaiveDate {
    now().date_naive()
}

/// The Friday after [`today`].
pub(crate) fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()
}

pub(crate) fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Open 17:00-22:00 every day, default settings, UTC.
pub(crate) fn dinner_profile() -> RestaurantProfile {
    RestaurantProfile {
        restaurant: Restaurant {
            id: RESTAURANT.into(),
            name: "Dinner Club".into(),
            timezone: "UTC".into(),
            is_active: true,
            created_at: now(),
            updated_at: now(),
        },
        settings: RestaurantSettings::defaults_for(RESTAURANT),
        operating_hours: (0..7)
            .map(|day| OperatingHours {
                restaurant_id: RESTAURANT.into(),
                day_of_week: day,
                open_time: 17 * 60,
                close_time: 22 * 60,
                is_open: true,
            })
            .collect(),
    }
}

pub(crate) fn table(id: &str, number: &str, capacity: i32) -> Table {
    Table {
        id: id.into(),
        restaurant_id: RESTAURANT.into(),
        table_number: number.into(),
        capacity,
        section: None,
        shape: TableShape::Square,
        pos_x: 0.0,
        pos_y: 0.0,
        width: 1.0,
        height: 1.0,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
}

/// A confirmed party of two on [`friday`].
pub(crate) fn booking(id: &str, table_id: Option<&str>, time: NaiveTime, duration: i32) -> Reservation {
    Reservation {
        id: id.into(),
        restaurant_id: RESTAURANT.into(),
        table_id: table_id.map(String::from),
        waitlist_entry_id: None,
        customer_name: "Guest".into(),
        customer_phone: None,
        customer_email: None,
        party_size: 2,
        date: friday(),
        time,
        duration_minutes: duration,
        status: ReservationStatus::Confirmed,
        special_requests: None,
        created_at: now(),
        updated_at: now(),
        confirmed_at: Some(now()),
        arrived_at: None,
        seated_at: None,
        completed_at: None,
        cancelled_at: None,
    }
}

/// A WAITING entry created `minute` minutes after [`now`], without a position.
pub(crate) fn waiting_entry(id: &str, party_size: i32, priority: i32, minute: i64) -> WaitlistEntry {
    let created = now() + Duration::minutes(minute);
    WaitlistEntry {
        id: id.into(),
        restaurant_id: RESTAURANT.into(),
        table_id: None,
        reservation_id: None,
        customer_name: format!("Party {id}"),
        customer_phone: None,
        customer_email: None,
        party_size,
        priority,
        position: None,
        estimated_wait_minutes: None,
        status: WaitlistStatus::Waiting,
        notification_count: 0,
        last_notified_at: None,
        seated_at: None,
        cancelled_at: None,
        notes: None,
        created_at: created,
        updated_at: created,
    }
}

/// An engine over a fresh [`MemoryStore`] holding `profile`, on the fixed clock.
pub(crate) async fn engine_with(
    profile: RestaurantProfile,
) -> (Engine<MemoryStore>, Arc<MemoryStore>, mpsc::Receiver<DomainEvent>) {
    let store = Arc::new(MemoryStore::new());
    store.put_profile(profile).await;
    let (engine, rx) = Engine::new(Arc::clone(&store), EngineConfig::default(), Arc::new(clock()));
    (engine, store, rx)
}
