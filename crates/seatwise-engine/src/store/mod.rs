//! # Store Contract
//!
//! The persistence operations the engine needs, as an injected trait.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BookingStore                                     │
//! │                                                                         │
//! │   reads          typed filters (TableFilter, ReservationFilter, ...)   │
//! │   writes         insert/update/delete per aggregate                    │
//! │   atomic         insert_reservation_checked  (check + insert)          │
//! │                  update_reservation_checked  (check + update)          │
//! │                  write_waitlist_positions    (one batch)               │
//! │                                                                         │
//! │        ┌──────────────────────┐       ┌──────────────────────────┐     │
//! │        │     MemoryStore      │       │  seatwise_db::Database   │     │
//! │        │  tests, demos        │       │  SQLite, BEGIN IMMEDIATE │     │
//! │        └──────────────────────┘       └──────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;

use seatwise_core::availability::BookingOutcome;
use seatwise_core::filter::{ReservationFilter, TableFilter, WaitlistFilter};
use seatwise_core::waitlist::PositionUpdate;
use seatwise_core::{BlackoutDate, Reservation, RestaurantProfile, Table, WaitlistEntry};

mod memory;
mod sqlite;

pub use memory::MemoryStore;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Backend-neutral store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update or position write named a record that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The backend failed (connection, constraint, I/O).
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<seatwise_db::DbError> for StoreError {
    fn from(err: seatwise_db::DbError) -> Self {
        match err {
            seatwise_db::DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Persistence operations consumed by the engine.
///
/// Lookups return `Ok(None)` for a missing record; only writes against a
/// missing record fail with [`StoreError::NotFound`].
#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    // ---- Restaurants ----

    /// Restaurant with settings and weekly hours.
    async fn restaurant_profile(&self, restaurant_id: &str) -> StoreResult<Option<RestaurantProfile>>;

    async fn blackout_dates(&self, restaurant_id: &str) -> StoreResult<Vec<BlackoutDate>>;

    // ---- Tables ----

    async fn table(&self, table_id: &str) -> StoreResult<Option<Table>>;

    /// Tables matching `filter`, smallest capacity first.
    async fn tables(&self, filter: &TableFilter) -> StoreResult<Vec<Table>>;

    // ---- Reservations ----

    async fn reservation(&self, reservation_id: &str) -> StoreResult<Option<Reservation>>;

    /// Reservations matching `filter`, by date then time.
    async fn reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    /// Inserts unless the reservation's table is held for its padded window.
    ///
    /// The check and the insert are one atomic unit.
    async fn insert_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome>;

    /// Same as [`insert_reservation_checked`](Self::insert_reservation_checked)
    /// for an existing row; the row never conflicts with itself.
    async fn update_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome>;

    /// Unchecked update, for changes that cannot create a conflict.
    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<()>;

    /// Returns whether a row was removed.
    async fn delete_reservation(&self, reservation_id: &str) -> StoreResult<bool>;

    // ---- Waitlist ----

    async fn waitlist_entry(&self, entry_id: &str) -> StoreResult<Option<WaitlistEntry>>;

    /// Entries matching `filter` in queue order.
    async fn waitlist_entries(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>>;

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()>;

    async fn update_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()>;

    /// Returns whether a row was removed.
    async fn delete_waitlist_entry(&self, entry_id: &str) -> StoreResult<bool>;

    /// Writes every position in one atomic batch.
    async fn write_waitlist_positions(
        &self,
        restaurant_id: &str,
        positions: &[PositionUpdate],
    ) -> StoreResult<()>;
}
