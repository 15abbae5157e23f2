//! # In-Memory Store
//!
//! A [`BookingStore`] held entirely in process memory.
//!
//! Every operation takes one lock over the whole state, so the checked
//! insert and the position batch are trivially atomic. Used by the engine
//! tests and handy for demos; nothing survives a restart.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use seatwise_core::availability::BookingOutcome;
use seatwise_core::filter::{ReservationFilter, TableFilter, WaitlistFilter};
use seatwise_core::waitlist::PositionUpdate;
use seatwise_core::{BlackoutDate, Reservation, RestaurantProfile, Table, WaitlistEntry};

use super::{BookingStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<String, RestaurantProfile>,
    blackouts: Vec<BlackoutDate>,
    tables: HashMap<String, Table>,
    reservations: HashMap<String, Reservation>,
    waitlist: HashMap<String, WaitlistEntry>,
    /// Operations that fail with a backend error (degradation tests).
    failing: HashSet<&'static str>,
}

/// In-memory [`BookingStore`].
///
/// ## Usage
/// ```rust,ignore
/// let store = MemoryStore::new();
/// store.put_profile(profile).await;
/// store.put_table(table).await;
/// let engine = Engine::new(Arc::new(store), EngineConfig::default());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    /// Artificial delay before every operation (deadline tests).
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation sleep for `latency` first.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes `operation` fail with [`StoreError::Backend`] until restored.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.state.write().await.failing.insert(operation);
    }

    pub async fn restore_operation(&self, operation: &'static str) {
        self.state.write().await.failing.remove(operation);
    }

    async fn enter(&self, operation: &'static str) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.state.read().await.failing.contains(operation) {
            return Err(StoreError::Backend(format!("{operation}: store unavailable")));
        }
        Ok(())
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub async fn put_profile(&self, profile: RestaurantProfile) {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.restaurant.id.clone(), profile);
    }

    pub async fn put_blackout(&self, blackout: BlackoutDate) {
        self.state.write().await.blackouts.push(blackout);
    }

    pub async fn put_table(&self, table: Table) {
        let mut state = self.state.write().await;
        state.tables.insert(table.id.clone(), table);
    }

    /// Stores a reservation as-is, without a conflict check (history).
    pub async fn put_reservation(&self, reservation: Reservation) {
        let mut state = self.state.write().await;
        state.reservations.insert(reservation.id.clone(), reservation);
    }

    /// Checked write shared by insert and update.
    async fn checked_write(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
        must_exist: bool,
    ) -> StoreResult<BookingOutcome> {
        let operation = if must_exist {
            "update_reservation_checked"
        } else {
            "insert_reservation_checked"
        };
        self.enter(operation).await?;
        let mut state = self.state.write().await;

        if must_exist && !state.reservations.contains_key(&reservation.id) {
            return Err(StoreError::not_found("Reservation", &reservation.id));
        }
        if !must_exist && state.reservations.contains_key(&reservation.id) {
            return Err(StoreError::Backend(format!(
                "Duplicate reservation id: '{}' already exists",
                reservation.id
            )));
        }

        let same_table: Vec<Reservation> = match reservation.table_id.as_deref() {
            Some(table_id) => state
                .reservations
                .values()
                .filter(|r| r.table_id.as_deref() == Some(table_id) && r.date == reservation.date)
                .filter(|r| r.status.occupies_table())
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let outcome = BookingOutcome::check(reservation, buffer_minutes, &same_table);
        if outcome.is_booked() {
            state
                .reservations
                .insert(reservation.id.clone(), reservation.clone());
        }

        debug!(id = %reservation.id, booked = outcome.is_booked(), "Memory checked write");
        Ok(outcome)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn restaurant_profile(&self, restaurant_id: &str) -> StoreResult<Option<RestaurantProfile>> {
        self.enter("restaurant_profile").await?;
        Ok(self.state.read().await.profiles.get(restaurant_id).cloned())
    }

    async fn blackout_dates(&self, restaurant_id: &str) -> StoreResult<Vec<BlackoutDate>> {
        self.enter("blackout_dates").await?;
        let state = self.state.read().await;
        let mut dates: Vec<BlackoutDate> = state
            .blackouts
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        dates.sort_by_key(|b| b.start_date);
        Ok(dates)
    }

    async fn table(&self, table_id: &str) -> StoreResult<Option<Table>> {
        self.enter("table").await?;
        Ok(self.state.read().await.tables.get(table_id).cloned())
    }

    async fn tables(&self, filter: &TableFilter) -> StoreResult<Vec<Table>> {
        self.enter("tables").await?;
        let state = self.state.read().await;
        let mut tables: Vec<Table> = state
            .tables
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tables.sort_by(|a, b| {
            a.capacity
                .cmp(&b.capacity)
                .then_with(|| a.table_number.cmp(&b.table_number))
        });
        Ok(tables)
    }

    async fn reservation(&self, reservation_id: &str) -> StoreResult<Option<Reservation>> {
        self.enter("reservation").await?;
        Ok(self.state.read().await.reservations.get(reservation_id).cloned())
    }

    async fn reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        self.enter("reservations").await?;
        let state = self.state.read().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| {
            (a.date, a.time, a.created_at).cmp(&(b.date, b.time, b.created_at))
        });
        Ok(reservations)
    }

    async fn insert_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome> {
        self.checked_write(reservation, buffer_minutes, false).await
    }

    async fn update_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome> {
        self.checked_write(reservation, buffer_minutes, true).await
    }

    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<()> {
        self.enter("update_reservation").await?;
        let mut state = self.state.write().await;
        match state.reservations.get_mut(&reservation.id) {
            Some(slot) => {
                *slot = reservation.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Reservation", &reservation.id)),
        }
    }

    async fn delete_reservation(&self, reservation_id: &str) -> StoreResult<bool> {
        self.enter("delete_reservation").await?;
        Ok(self
            .state
            .write()
            .await
            .reservations
            .remove(reservation_id)
            .is_some())
    }

    async fn waitlist_entry(&self, entry_id: &str) -> StoreResult<Option<WaitlistEntry>> {
        self.enter("waitlist_entry").await?;
        Ok(self.state.read().await.waitlist.get(entry_id).cloned())
    }

    async fn waitlist_entries(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>> {
        self.enter("waitlist_entries").await?;
        let state = self.state.read().await;
        let mut entries: Vec<WaitlistEntry> = state
            .waitlist
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            (a.position.is_none(), a.position, a.created_at)
                .cmp(&(b.position.is_none(), b.position, b.created_at))
        });
        Ok(entries)
    }

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()> {
        self.enter("insert_waitlist_entry").await?;
        let mut state = self.state.write().await;
        if state.waitlist.contains_key(&entry.id) {
            return Err(StoreError::Backend(format!(
                "Duplicate waitlist entry id: '{}' already exists",
                entry.id
            )));
        }
        state.waitlist.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn update_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()> {
        self.enter("update_waitlist_entry").await?;
        let mut state = self.state.write().await;
        match state.waitlist.get_mut(&entry.id) {
            Some(slot) => {
                *slot = entry.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("WaitlistEntry", &entry.id)),
        }
    }

    async fn delete_waitlist_entry(&self, entry_id: &str) -> StoreResult<bool> {
        self.enter("delete_waitlist_entry").await?;
        Ok(self.state.write().await.waitlist.remove(entry_id).is_some())
    }

    async fn write_waitlist_positions(
        &self,
        restaurant_id: &str,
        positions: &[PositionUpdate],
    ) -> StoreResult<()> {
        self.enter("write_waitlist_positions").await?;
        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything
        for update in positions {
            match state.waitlist.get(&update.entry_id) {
                Some(e) if e.restaurant_id == restaurant_id => {}
                _ => return Err(StoreError::not_found("WaitlistEntry", &update.entry_id)),
            }
        }

        for update in positions {
            if let Some(entry) = state.waitlist.get_mut(&update.entry_id) {
                entry.position = Some(update.position);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booking, dinner_profile, friday, hm, table, RESTAURANT};

    #[tokio::test]
    async fn test_checked_insert_rejects_overlap() {
        let store = MemoryStore::new();
        store.put_profile(dinner_profile()).await;
        store.put_table(table("t1", "1", 2)).await;

        let a = booking("a", Some("t1"), hm(19, 0), 120);
        assert!(store.insert_reservation_checked(&a, 15).await.unwrap().is_booked());

        let b = booking("b", Some("t1"), hm(19, 30), 60);
        let outcome = store.insert_reservation_checked(&b, 15).await.unwrap();
        assert_eq!(outcome, BookingOutcome::Conflicted(vec![a.clone()]));
        assert!(store.reservation("b").await.unwrap().is_none());

        // Duplicate ids are a backend failure, not a conflict
        assert!(store.insert_reservation_checked(&a, 15).await.is_err());
    }

    #[tokio::test]
    async fn test_update_checked_requires_existing_row() {
        let store = MemoryStore::new();
        let a = booking("a", Some("t1"), hm(19, 0), 120);
        let err = store.update_reservation_checked(&a, 15).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_filters_and_ordering() {
        let store = MemoryStore::new();
        store.put_table(table("big", "9", 8)).await;
        store.put_table(table("small", "1", 2)).await;
        store.put_reservation(booking("late", None, hm(21, 0), 60)).await;
        store.put_reservation(booking("early", None, hm(17, 0), 60)).await;

        let tables = store.tables(&TableFilter::active(RESTAURANT)).await.unwrap();
        assert_eq!(tables[0].id, "small");

        let day = store
            .reservations(&ReservationFilter::for_restaurant(RESTAURANT).on(friday()))
            .await
            .unwrap();
        assert_eq!(day.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_position_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let entry = crate::testing::waiting_entry("w1", 2, 5, 0);
        store.insert_waitlist_entry(&entry).await.unwrap();

        let batch = vec![
            PositionUpdate { entry_id: "w1".into(), position: 1 },
            PositionUpdate { entry_id: "ghost".into(), position: 2 },
        ];
        assert!(store.write_waitlist_positions(RESTAURANT, &batch).await.is_err());
        assert_eq!(store.waitlist_entry("w1").await.unwrap().unwrap().position, None);

        store
            .write_waitlist_positions(RESTAURANT, &batch[..1])
            .await
            .unwrap();
        assert_eq!(store.waitlist_entry("w1").await.unwrap().unwrap().position, Some(1));
    }
}
