//! # Domain Types
//!
//! Core domain types used throughout Seatwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │                      ┌──────────────────────┐                           │
//! │                      │      Restaurant      │                           │
//! │                      │  settings, hours,    │                           │
//! │                      │  blackout dates      │                           │
//! │                      └──────────┬───────────┘                           │
//! │               ┌─────────────────┼──────────────────┐                    │
//! │               ▼                 ▼                  ▼                    │
//! │  ┌─────────────────┐  ┌──────────────────┐  ┌─────────────────┐        │
//! │  │      Table      │◄─┤   Reservation    │  │  WaitlistEntry  │        │
//! │  │  capacity       │  │  date, time      │  │  priority       │        │
//! │  │  section/layout │  │  duration, party │  │  position       │        │
//! │  │  is_active      │  │  status          │  │  status         │        │
//! │  └─────────────────┘  └──────────────────┘  └─────────────────┘        │
//! │                                                                         │
//! │  Everything is owned by exactly one restaurant. Tables are never       │
//! │  removed while booked; they are deactivated instead.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time Representation
//! - Reservation dates/times are restaurant-local `NaiveDate`/`NaiveTime`.
//! - Operating hours are minute offsets from local midnight.
//! - Audit timestamps (`*_at`) are UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::availability::TimeWindow;
use crate::MINUTES_PER_DAY;

// =============================================================================
// Restaurant
// =============================================================================

/// A restaurant taking bookings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Restaurant {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// IANA timezone name, e.g. "Europe/Berlin".
    pub timezone: String,

    /// Deactivated restaurants accept no bookings (never deleted).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// Parses the configured timezone, falling back to UTC when unknown.
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or(Tz::UTC)
    }

    /// Converts an instant into the restaurant's wall-clock time.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.tz()).naive_local()
    }
}

/// Booking limits configured per restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RestaurantSettings {
    pub restaurant_id: String,
    /// How far ahead a booking may be made (days).
    pub max_advance_booking_days: i32,
    /// Minimum lead time between now and the requested start (minutes).
    pub min_advance_booking_minutes: i32,
    pub min_party_size: i32,
    pub max_party_size: i32,
    pub min_reservation_duration: i32,
    pub max_reservation_duration: i32,
    /// Duration used when a caller does not specify one (minutes).
    pub default_reservation_duration: i32,
}

impl RestaurantSettings {
    /// Settings a freshly onboarded restaurant starts with.
    pub fn defaults_for(restaurant_id: impl Into<String>) -> Self {
        RestaurantSettings {
            restaurant_id: restaurant_id.into(),
            max_advance_booking_days: 60,
            min_advance_booking_minutes: 30,
            min_party_size: 1,
            max_party_size: 20,
            min_reservation_duration: 30,
            max_reservation_duration: 480,
            default_reservation_duration: 120,
        }
    }
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OperatingHours {
    pub restaurant_id: String,
    /// 0 = Sunday ... 6 = Saturday.
    pub day_of_week: i32,
    /// Minutes from local midnight.
    pub open_time: i32,
    /// Minutes from local midnight; may exceed 1440 for after-midnight closing.
    pub close_time: i32,
    pub is_open: bool,
}

impl OperatingHours {
    /// Whether `[start, end]` lies inside the opening window.
    pub fn contains(&self, window: &TimeWindow) -> bool {
        self.is_open && window.start >= self.open_time && window.end <= self.close_time
    }
}

/// Weekday index used by [`OperatingHours::day_of_week`].
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Minutes since midnight for a wall-clock time.
pub fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Wall-clock time for a minute offset, wrapping past midnight.
pub fn time_from_minutes(minutes: i32) -> NaiveTime {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// A restaurant together with everything the validator needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestaurantProfile {
    pub restaurant: Restaurant,
    pub settings: RestaurantSettings,
    pub operating_hours: Vec<OperatingHours>,
}

impl RestaurantProfile {
    /// Operating hours for the weekday of `date`, if configured.
    pub fn hours_for(&self, date: NaiveDate) -> Option<&OperatingHours> {
        let dow = day_of_week(date);
        self.operating_hours.iter().find(|h| h.day_of_week == dow)
    }
}

/// A date or inclusive date range with no bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BlackoutDate {
    pub id: String,
    pub restaurant_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// `None` means a single-day blackout.
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

impl BlackoutDate {
    pub fn covers(&self, date: NaiveDate) -> bool {
        let end = self.end_date.unwrap_or(self.start_date);
        date >= self.start_date && date <= end
    }
}

// =============================================================================
// Table
// =============================================================================

/// Floor-plan shape of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableShape {
    #[default]
    Square,
    Rectangle,
    Round,
    Booth,
}

/// A bookable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Table {
    pub id: String,
    pub restaurant_id: String,
    /// Label staff use on the floor ("12", "Patio 3").
    pub table_number: String,
    /// Seats, always positive.
    pub capacity: i32,
    /// Section/location label ("patio", "bar").
    pub section: Option<String>,
    pub shape: TableShape,
    pub pos_x: f64,
    pub pos_y: f64,
    pub width: f64,
    pub height: f64,
    /// Soft delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Table {
    /// Whether the table can host `party_size` guests at all.
    #[inline]
    pub fn seats(&self, party_size: i32) -> bool {
        self.capacity >= party_size
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// Lifecycle of a reservation.
///
/// ```text
/// PENDING ──► CONFIRMED ──► ARRIVED ──► SEATED ──► COMPLETED
///    │            │            │  └──────────▲
///    │            │            │  (CONFIRMED ─┘ walk straight to table)
///    ├────────────┴────────────┴──► CANCELLED
///    └────────────┴───────────────► NO_SHOW
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    #[default]
    Confirmed,
    Arrived,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Statuses that hold a table and take part in conflict detection.
    pub const OCCUPYING: [ReservationStatus; 3] = [
        ReservationStatus::Confirmed,
        ReservationStatus::Arrived,
        ReservationStatus::Seated,
    ];

    /// Statuses that may still need a table later today.
    pub const UPCOMING: [ReservationStatus; 3] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Arrived,
    ];

    /// Whether a reservation in this status blocks its table.
    pub fn occupies_table(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Arrived)
                | (Confirmed, Seated)
                | (Arrived, Seated)
                | (Seated, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Arrived, Cancelled)
                | (Pending, NoShow)
                | (Confirmed, NoShow)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Arrived => "arrived",
            ReservationStatus::Seated => "seated",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A booking for a party at a date and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub restaurant_id: String,
    /// Assigned table, if any.
    pub table_id: Option<String>,
    /// Waitlist entry this reservation was promoted from.
    pub waitlist_entry_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub party_size: i32,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub status: ReservationStatus,
    pub special_requests: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub arrived_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub seated_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// The unpadded `[start, end)` window in minutes from midnight.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.time, self.duration_minutes)
    }

    /// Moves the reservation into `next`, stamping the matching timestamp.
    ///
    /// The caller is responsible for checking
    /// [`ReservationStatus::can_transition_to`] first.
    pub fn apply_status(&mut self, next: ReservationStatus, now: DateTime<Utc>) {
        self.status = next;
        self.updated_at = now;
        match next {
            ReservationStatus::Confirmed => self.confirmed_at = Some(now),
            ReservationStatus::Arrived => self.arrived_at = Some(now),
            ReservationStatus::Seated => self.seated_at = Some(now),
            ReservationStatus::Completed => self.completed_at = Some(now),
            ReservationStatus::Cancelled => self.cancelled_at = Some(now),
            ReservationStatus::Pending | ReservationStatus::NoShow => {}
        }
    }
}

// =============================================================================
// Waitlist
// =============================================================================

/// Lifecycle of a waitlist entry.
///
/// ```text
/// WAITING ──► NOTIFIED ──► SEATED (terminal, became a reservation)
///    │            │
///    ├────────────┴──► CANCELLED
///    └────────────┴──► NO_SHOW
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    #[default]
    Waiting,
    Notified,
    Seated,
    Cancelled,
    NoShow,
}

impl WaitlistStatus {
    /// Still in line (waiting or called but not yet seated).
    pub fn is_open(&self) -> bool {
        matches!(self, WaitlistStatus::Waiting | WaitlistStatus::Notified)
    }

    pub fn can_transition_to(&self, next: WaitlistStatus) -> bool {
        use WaitlistStatus::*;
        matches!(
            (self, next),
            (Waiting, Notified)
                | (Notified, Notified)
                | (Waiting, Seated)
                | (Notified, Seated)
                | (Waiting, Cancelled)
                | (Notified, Cancelled)
                | (Waiting, NoShow)
                | (Notified, NoShow)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Waiting => "waiting",
            WaitlistStatus::Notified => "notified",
            WaitlistStatus::Seated => "seated",
            WaitlistStatus::Cancelled => "cancelled",
            WaitlistStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A party waiting for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WaitlistEntry {
    pub id: String,
    pub restaurant_id: String,
    /// Table the party was seated at.
    pub table_id: Option<String>,
    /// Reservation created on promotion.
    pub reservation_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub party_size: i32,
    /// 1 (lowest) to 10 (highest).
    pub priority: i32,
    /// 1-based place in line; dense among WAITING entries, cleared once
    /// the entry leaves the queue for good.
    pub position: Option<i32>,
    pub estimated_wait_minutes: Option<i32>,
    pub status: WaitlistStatus,
    pub notification_count: i32,
    #[ts(as = "Option<String>")]
    pub last_notified_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub seated_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Moves the entry into `next`, updating counters and timestamps.
    pub fn apply_status(&mut self, next: WaitlistStatus, now: DateTime<Utc>) {
        self.status = next;
        self.updated_at = now;
        match next {
            WaitlistStatus::Notified => {
                self.notification_count += 1;
                self.last_notified_at = Some(now);
            }
            WaitlistStatus::Seated => {
                self.seated_at = Some(now);
                self.position = None;
            }
            WaitlistStatus::Cancelled | WaitlistStatus::NoShow => {
                self.cancelled_at = Some(now);
                self.position = None;
            }
            WaitlistStatus::Waiting => {}
        }
    }
}

/// Contact details shared by reservations and waitlist entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
