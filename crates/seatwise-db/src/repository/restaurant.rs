//! # Restaurant Repository
//!
//! Restaurants and everything the rule validator reads about them:
//! settings, weekly operating hours and blackout dates.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use seatwise_core::{BlackoutDate, OperatingHours, Restaurant, RestaurantProfile, RestaurantSettings};

const RESTAURANT_COLUMNS: &str = "id, name, timezone, is_active, created_at, updated_at";

const SETTINGS_COLUMNS: &str = "restaurant_id, max_advance_booking_days, \
     min_advance_booking_minutes, min_party_size, max_party_size, \
     min_reservation_duration, max_reservation_duration, default_reservation_duration";

/// Repository for restaurant database operations.
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    /// Creates a new RestaurantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    /// Gets a restaurant by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Restaurant>> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1");
        let restaurant = sqlx::query_as::<_, Restaurant>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(restaurant)
    }

    /// Loads a restaurant with its settings and operating hours.
    ///
    /// A restaurant without a settings row gets the onboarding defaults.
    pub async fn profile(&self, id: &str) -> DbResult<Option<RestaurantProfile>> {
        let Some(restaurant) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM restaurant_settings WHERE restaurant_id = ?1");
        let settings = sqlx::query_as::<_, RestaurantSettings>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .unwrap_or_else(|| RestaurantSettings::defaults_for(id));

        let operating_hours = sqlx::query_as::<_, OperatingHours>(
            r#"
            SELECT restaurant_id, day_of_week, open_time, close_time, is_open
            FROM operating_hours
            WHERE restaurant_id = ?1
            ORDER BY day_of_week
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        debug!(restaurant_id = %id, hours = operating_hours.len(), "Loaded restaurant profile");

        Ok(Some(RestaurantProfile {
            restaurant,
            settings,
            operating_hours,
        }))
    }

    /// Inserts a new restaurant.
    pub async fn insert(&self, restaurant: &Restaurant) -> DbResult<()> {
        debug!(id = %restaurant.id, name = %restaurant.name, "Inserting restaurant");

        sqlx::query(
            r#"
            INSERT INTO restaurants (id, name, timezone, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.timezone)
        .bind(restaurant.is_active)
        .bind(restaurant.created_at)
        .bind(restaurant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Activates or deactivates a restaurant. Restaurants are never deleted.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE restaurants SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }
        Ok(())
    }

    /// Inserts or replaces the settings row.
    pub async fn upsert_settings(&self, settings: &RestaurantSettings) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO restaurant_settings (
                restaurant_id, max_advance_booking_days, min_advance_booking_minutes,
                min_party_size, max_party_size,
                min_reservation_duration, max_reservation_duration, default_reservation_duration
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(restaurant_id) DO UPDATE SET
                max_advance_booking_days = excluded.max_advance_booking_days,
                min_advance_booking_minutes = excluded.min_advance_booking_minutes,
                min_party_size = excluded.min_party_size,
                max_party_size = excluded.max_party_size,
                min_reservation_duration = excluded.min_reservation_duration,
                max_reservation_duration = excluded.max_reservation_duration,
                default_reservation_duration = excluded.default_reservation_duration
            "#,
        )
        .bind(&settings.restaurant_id)
        .bind(settings.max_advance_booking_days)
        .bind(settings.min_advance_booking_minutes)
        .bind(settings.min_party_size)
        .bind(settings.max_party_size)
        .bind(settings.min_reservation_duration)
        .bind(settings.max_reservation_duration)
        .bind(settings.default_reservation_duration)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the whole weekly schedule in one transaction.
    pub async fn replace_operating_hours(
        &self,
        restaurant_id: &str,
        hours: &[OperatingHours],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM operating_hours WHERE restaurant_id = ?1")
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

        for h in hours {
            sqlx::query(
                r#"
                INSERT INTO operating_hours (restaurant_id, day_of_week, open_time, close_time, is_open)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(restaurant_id)
            .bind(h.day_of_week)
            .bind(h.open_time)
            .bind(h.close_time)
            .bind(h.is_open)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(restaurant_id = %restaurant_id, days = hours.len(), "Replaced operating hours");
        Ok(())
    }

    /// All blackout dates of a restaurant, earliest first.
    pub async fn blackout_dates(&self, restaurant_id: &str) -> DbResult<Vec<BlackoutDate>> {
        let dates = sqlx::query_as::<_, BlackoutDate>(
            r#"
            SELECT id, restaurant_id, start_date, end_date, reason
            FROM blackout_dates
            WHERE restaurant_id = ?1
            ORDER BY start_date
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }

    pub async fn insert_blackout(&self, blackout: &BlackoutDate) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blackout_dates (id, restaurant_id, start_date, end_date, reason)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&blackout.id)
        .bind(&blackout.restaurant_id)
        .bind(blackout.start_date)
        .bind(blackout.end_date)
        .bind(&blackout.reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of restaurants (used by the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db_with_restaurant;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_profile_round_trip() {
        let (db, restaurant) = db_with_restaurant().await;

        let profile = db.restaurants().profile(&restaurant.id).await.unwrap().unwrap();
        assert_eq!(profile.restaurant.name, "Test Bistro");
        assert_eq!(profile.settings.max_party_size, 20);
        assert_eq!(profile.operating_hours.len(), 7);
        assert_eq!(profile.operating_hours[0].day_of_week, 0);

        assert!(db.restaurants().profile("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (db, restaurant) = db_with_restaurant().await;

        db.restaurants().set_active(&restaurant.id, false).await.unwrap();
        let stored = db.restaurants().get_by_id(&restaurant.id).await.unwrap().unwrap();
        assert!(!stored.is_active);

        let err = db.restaurants().set_active("missing", false).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_blackout_dates() {
        let (db, restaurant) = db_with_restaurant().await;
        let blackout = BlackoutDate {
            id: "b1".into(),
            restaurant_id: restaurant.id.clone(),
            start_date: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2026, 12, 26).unwrap()),
            reason: Some("Holidays".into()),
        };
        db.restaurants().insert_blackout(&blackout).await.unwrap();

        let stored = db.restaurants().blackout_dates(&restaurant.id).await.unwrap();
        assert_eq!(stored, vec![blackout]);
    }
}
