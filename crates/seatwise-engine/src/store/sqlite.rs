//! # SQLite Store
//!
//! [`BookingStore`] over `seatwise_db::Database`. Each method forwards to
//! the matching repository; the atomic operations are the repositories'
//! `BEGIN IMMEDIATE` checked writes and the single-transaction position
//! batch.

use async_trait::async_trait;

use seatwise_core::availability::BookingOutcome;
use seatwise_core::filter::{ReservationFilter, TableFilter, WaitlistFilter};
use seatwise_core::waitlist::PositionUpdate;
use seatwise_core::{BlackoutDate, Reservation, RestaurantProfile, Table, WaitlistEntry};
use seatwise_db::Database;

use super::{BookingStore, StoreResult};

#[async_trait]
impl BookingStore for Database {
    async fn restaurant_profile(&self, restaurant_id: &str) -> StoreResult<Option<RestaurantProfile>> {
        Ok(self.restaurants().profile(restaurant_id).await?)
    }

    async fn blackout_dates(&self, restaurant_id: &str) -> StoreResult<Vec<BlackoutDate>> {
        Ok(self.restaurants().blackout_dates(restaurant_id).await?)
    }

    async fn table(&self, table_id: &str) -> StoreResult<Option<Table>> {
        Ok(self.tables().get_by_id(table_id).await?)
    }

    async fn tables(&self, filter: &TableFilter) -> StoreResult<Vec<Table>> {
        Ok(Database::tables(self).list(filter).await?)
    }

    async fn reservation(&self, reservation_id: &str) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations().get_by_id(reservation_id).await?)
    }

    async fn reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        Ok(Database::reservations(self).list(filter).await?)
    }

    async fn insert_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome> {
        Ok(Database::reservations(self)
            .insert_checked(reservation, buffer_minutes)
            .await?)
    }

    async fn update_reservation_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> StoreResult<BookingOutcome> {
        Ok(Database::reservations(self)
            .update_checked(reservation, buffer_minutes)
            .await?)
    }

    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<()> {
        Ok(Database::reservations(self).update(reservation).await?)
    }

    async fn delete_reservation(&self, reservation_id: &str) -> StoreResult<bool> {
        Ok(Database::reservations(self).delete(reservation_id).await?)
    }

    async fn waitlist_entry(&self, entry_id: &str) -> StoreResult<Option<WaitlistEntry>> {
        Ok(self.waitlist().get_by_id(entry_id).await?)
    }

    async fn waitlist_entries(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>> {
        Ok(self.waitlist().list(filter).await?)
    }

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()> {
        Ok(self.waitlist().insert(entry).await?)
    }

    async fn update_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()> {
        Ok(self.waitlist().update(entry).await?)
    }

    async fn delete_waitlist_entry(&self, entry_id: &str) -> StoreResult<bool> {
        Ok(self.waitlist().delete(entry_id).await?)
    }

    async fn write_waitlist_positions(
        &self,
        restaurant_id: &str,
        positions: &[PositionUpdate],
    ) -> StoreResult<()> {
        Ok(self.waitlist().write_positions(restaurant_id, positions).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use seatwise_core::{ReservationStatus, RestaurantSettings};
    use seatwise_db::DbConfig;

    use crate::testing::{booking, dinner_profile, hm, table, RESTAURANT};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let profile = dinner_profile();
        db.restaurants().insert(&profile.restaurant).await.unwrap();
        db.restaurants()
            .upsert_settings(&RestaurantSettings::defaults_for(RESTAURANT))
            .await
            .unwrap();
        db.restaurants()
            .replace_operating_hours(RESTAURANT, &profile.operating_hours)
            .await
            .unwrap();
        Database::tables(&db).insert(&table("t1", "1", 2)).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let db = seeded().await;
        let store: &dyn BookingStore = &db;

        let profile = store.restaurant_profile(RESTAURANT).await.unwrap().unwrap();
        assert_eq!(profile.operating_hours.len(), 7);
        assert!(store.table("t1").await.unwrap().is_some());

        let a = booking("a", Some("t1"), hm(19, 0), 120);
        assert!(store.insert_reservation_checked(&a, 15).await.unwrap().is_booked());

        let b = booking("b", Some("t1"), hm(19, 30), 60);
        assert!(!store.insert_reservation_checked(&b, 15).await.unwrap().is_booked());

        let mut cancelled = a.clone();
        cancelled.apply_status(ReservationStatus::Cancelled, Utc::now());
        store.update_reservation(&cancelled).await.unwrap();
        assert!(store.insert_reservation_checked(&b, 15).await.unwrap().is_booked());
    }

    #[tokio::test]
    async fn test_missing_rows_map_to_not_found() {
        let db = seeded().await;
        let store: &dyn BookingStore = &db;
        let ghost = booking("ghost", None, hm(18, 0), 60);

        let err = store.update_reservation(&ghost).await.unwrap_err();
        assert!(matches!(err, crate::store::StoreError::NotFound { .. }));
    }
}
