//! # Reservation Repository
//!
//! Database operations for reservations.
//!
//! ## Conflict-Checked Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    insert_checked / update_checked                      │
//! │                                                                         │
//! │  pool.begin_with("BEGIN IMMEDIATE")  ← write lock taken now            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT occupying reservations on (table_id, date)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookingOutcome::check (seatwise-core)                                  │
//! │       │                                                                 │
//! │       ├── Conflicted ──► ROLLBACK, return the conflicts                │
//! │       │                                                                 │
//! │       └── Booked ──► INSERT / UPDATE ──► COMMIT                         │
//! │                                                                         │
//! │  A second writer blocks on BEGIN IMMEDIATE until the first commits,    │
//! │  then sees its row in the SELECT. A dropped Transaction rolls back.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use seatwise_core::availability::BookingOutcome;
use seatwise_core::filter::ReservationFilter;
use seatwise_core::{Reservation, ReservationStatus};

const RESERVATION_COLUMNS: &str = "id, restaurant_id, table_id, waitlist_entry_id, \
     customer_name, customer_phone, customer_email, party_size, date, time, \
     duration_minutes, status, special_requests, created_at, updated_at, \
     confirmed_at, arrived_at, seated_at, completed_at, cancelled_at";

/// Whether a checked write creates or replaces the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Update,
}

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Gets a reservation by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1");
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reservation)
    }

    /// Lists reservations matching `filter`, ordered by date then time.
    pub async fn list(&self, filter: &ReservationFilter) -> DbResult<Vec<Reservation>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE restaurant_id = "
        ));
        qb.push_bind(filter.restaurant_id.clone());

        if let Some(date) = filter.date {
            qb.push(" AND date = ").push_bind(date);
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND date <= ").push_bind(to);
        }
        if let Some(statuses) = &filter.status_in {
            push_status_in(&mut qb, statuses);
        }
        if let Some(table_id) = &filter.table_id {
            qb.push(" AND table_id = ").push_bind(table_id.clone());
        }
        if filter.unassigned_only {
            qb.push(" AND table_id IS NULL");
        }
        if let Some(exclude) = &filter.exclude_id {
            qb.push(" AND id <> ").push_bind(exclude.clone());
        }
        qb.push(" ORDER BY date, time, created_at");

        let reservations = qb.build_query_as::<Reservation>().fetch_all(&self.pool).await?;

        debug!(
            restaurant_id = %filter.restaurant_id,
            count = reservations.len(),
            "Listed reservations"
        );
        Ok(reservations)
    }

    /// Inserts without a conflict check (unassigned or historic rows).
    pub async fn insert(&self, reservation: &Reservation) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_row(&mut conn, reservation, WriteMode::Insert).await
    }

    /// Replaces a row without a conflict check (status moves that free a table).
    pub async fn update(&self, reservation: &Reservation) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_row(&mut conn, reservation, WriteMode::Update).await
    }

    /// Inserts `reservation` unless its table is taken for the padded window.
    pub async fn insert_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> DbResult<BookingOutcome> {
        self.checked_write(reservation, buffer_minutes, WriteMode::Insert).await
    }

    /// Updates `reservation` in place unless its new window collides with
    /// another booking. The row never conflicts with itself.
    pub async fn update_checked(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
    ) -> DbResult<BookingOutcome> {
        self.checked_write(reservation, buffer_minutes, WriteMode::Update).await
    }

    async fn checked_write(
        &self,
        reservation: &Reservation,
        buffer_minutes: i32,
        mode: WriteMode,
    ) -> DbResult<BookingOutcome> {
        // Dropping `tx` (a request deadline cancels this future) rolls back
        // before the connection is reused.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let outcome = check_then_write(&mut *tx, reservation, buffer_minutes, mode).await;

        let finished = match &outcome {
            Ok(BookingOutcome::Booked) => tx.commit().await,
            Ok(BookingOutcome::Conflicted(_)) | Err(_) => tx.rollback().await,
        };
        if let Err(e) = finished {
            warn!(id = %reservation.id, error = %e, "Failed to finish transaction");
            return Err(DbError::TransactionFailed(e.to_string()));
        }

        match &outcome {
            Ok(BookingOutcome::Booked) => {
                debug!(id = %reservation.id, table_id = ?reservation.table_id, ?mode, "Checked write committed");
            }
            Ok(BookingOutcome::Conflicted(conflicts)) => {
                debug!(id = %reservation.id, conflicts = conflicts.len(), "Checked write rejected");
            }
            Err(_) => {}
        }

        outcome
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Completed reservations of a restaurant between two dates (inclusive),
    /// the input for turnover estimates.
    pub async fn completed_between(
        &self,
        restaurant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Reservation>> {
        self.list(
            &ReservationFilter::for_restaurant(restaurant_id)
                .between(from, to)
                .with_statuses(&[ReservationStatus::Completed]),
        )
        .await
    }
}

/// Appends `AND status IN (...)`; an empty set matches nothing.
fn push_status_in(qb: &mut QueryBuilder<'_, Sqlite>, statuses: &[ReservationStatus]) {
    if statuses.is_empty() {
        qb.push(" AND 0");
        return;
    }
    qb.push(" AND status IN (");
    let mut separated = qb.separated(", ");
    for status in statuses {
        separated.push_bind(*status);
    }
    separated.push_unseparated(")");
}

/// Runs inside an open `BEGIN IMMEDIATE` transaction.
async fn check_then_write(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
    buffer_minutes: i32,
    mode: WriteMode,
) -> DbResult<BookingOutcome> {
    let existing = match reservation.table_id.as_deref() {
        Some(table_id) => {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE table_id = "
            ));
            qb.push_bind(table_id.to_string());
            qb.push(" AND date = ").push_bind(reservation.date);
            push_status_in(&mut qb, &ReservationStatus::OCCUPYING);
            qb.push(" AND id <> ").push_bind(reservation.id.clone());

            qb.build_query_as::<Reservation>().fetch_all(&mut *conn).await?
        }
        None => Vec::new(),
    };

    let outcome = BookingOutcome::check(reservation, buffer_minutes, &existing);
    if outcome.is_booked() {
        write_row(conn, reservation, mode).await?;
    }
    Ok(outcome)
}

async fn write_row(conn: &mut SqliteConnection, r: &Reservation, mode: WriteMode) -> DbResult<()> {
    let sql = match mode {
        WriteMode::Insert => {
            r#"
            INSERT INTO reservations (
                restaurant_id, table_id, waitlist_entry_id,
                customer_name, customer_phone, customer_email,
                party_size, date, time, duration_minutes, status, special_requests,
                created_at, updated_at, confirmed_at, arrived_at, seated_at,
                completed_at, cancelled_at, id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#
        }
        WriteMode::Update => {
            r#"
            UPDATE reservations SET
                restaurant_id = ?1, table_id = ?2, waitlist_entry_id = ?3,
                customer_name = ?4, customer_phone = ?5, customer_email = ?6,
                party_size = ?7, date = ?8, time = ?9, duration_minutes = ?10,
                status = ?11, special_requests = ?12,
                created_at = ?13, updated_at = ?14, confirmed_at = ?15, arrived_at = ?16,
                seated_at = ?17, completed_at = ?18, cancelled_at = ?19
            WHERE id = ?20
            "#
        }
    };

    let result = sqlx::query(sql)
        .bind(&r.restaurant_id)
        .bind(&r.table_id)
        .bind(&r.waitlist_entry_id)
        .bind(&r.customer_name)
        .bind(&r.customer_phone)
        .bind(&r.customer_email)
        .bind(r.party_size)
        .bind(r.date)
        .bind(r.time)
        .bind(r.duration_minutes)
        .bind(r.status)
        .bind(&r.special_requests)
        .bind(r.created_at)
        .bind(r.updated_at)
        .bind(r.confirmed_at)
        .bind(r.arrived_at)
        .bind(r.seated_at)
        .bind(r.completed_at)
        .bind(r.cancelled_at)
        .bind(&r.id)
        .execute(&mut *conn)
        .await?;

    if mode == WriteMode::Update && result.rows_affected() == 0 {
        return Err(DbError::not_found("Reservation", &r.id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db_with_restaurant, seed_restaurant, table};
    use crate::{Database, DbConfig};
    use chrono::{NaiveTime, Utc};
    use std::time::Duration;
    use uuid::Uuid;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()
    }

    fn reservation(restaurant_id: &str, table_id: Option<&str>, h: u32, m: u32, duration: i32) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.to_string(),
            table_id: table_id.map(str::to_string),
            waitlist_entry_id: None,
            customer_name: "Guest".to_string(),
            customer_phone: Some("+1 555 0100".to_string()),
            customer_email: None,
            party_size: 2,
            date: friday(),
            time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
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

    #[tokio::test]
    async fn test_checked_insert_scenario() {
        let (db, restaurant) = db_with_restaurant().await;
        let t = table(&restaurant.id, "1", 2);
        db.tables().insert(&t).await.unwrap();
        let repo = db.reservations();

        let a = reservation(&restaurant.id, Some(&t.id), 19, 0, 120);
        assert_eq!(repo.insert_checked(&a, 15).await.unwrap(), BookingOutcome::Booked);

        let b = reservation(&restaurant.id, Some(&t.id), 19, 30, 60);
        match repo.insert_checked(&b, 15).await.unwrap() {
            BookingOutcome::Conflicted(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].id, a.id);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(repo.get_by_id(&b.id).await.unwrap().is_none());

        let c = reservation(&restaurant.id, Some(&t.id), 21, 20, 60);
        assert!(repo.insert_checked(&c, 15).await.unwrap().is_booked());

        let stored = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(stored, a);
    }

    #[tokio::test]
    async fn test_update_checked_excludes_itself() {
        let (db, restaurant) = db_with_restaurant().await;
        let t = table(&restaurant.id, "1", 2);
        db.tables().insert(&t).await.unwrap();
        let repo = db.reservations();

        let mut a = reservation(&restaurant.id, Some(&t.id), 19, 0, 120);
        repo.insert_checked(&a, 15).await.unwrap();
        let late = reservation(&restaurant.id, Some(&t.id), 21, 30, 60);
        repo.insert_checked(&late, 15).await.unwrap();

        a.time = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        assert!(repo.update_checked(&a, 15).await.unwrap().is_booked());

        a.duration_minutes = 180;
        assert!(!repo.update_checked(&a, 15).await.unwrap().is_booked());
        let stored = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.duration_minutes, 120);
    }

    #[tokio::test]
    async fn test_cancelled_rows_free_the_table() {
        let (db, restaurant) = db_with_restaurant().await;
        let t = table(&restaurant.id, "1", 2);
        db.tables().insert(&t).await.unwrap();
        let repo = db.reservations();

        let mut a = reservation(&restaurant.id, Some(&t.id), 19, 0, 120);
        repo.insert_checked(&a, 15).await.unwrap();
        a.apply_status(ReservationStatus::Cancelled, Utc::now());
        repo.update(&a).await.unwrap();

        let b = reservation(&restaurant.id, Some(&t.id), 19, 0, 120);
        assert!(repo.insert_checked(&b, 15).await.unwrap().is_booked());
    }

    #[tokio::test]
    async fn test_cancelled_checked_insert_rolls_back() {
        let (db, restaurant) = db_with_restaurant().await;
        let t1 = table(&restaurant.id, "1", 2);
        let t2 = table(&restaurant.id, "2", 2);
        db.tables().insert(&t1).await.unwrap();
        db.tables().insert(&t2).await.unwrap();
        let repo = db.reservations();

        // Some of these deadlines land between BEGIN and COMMIT. The single
        // in-memory connection must come back usable every time.
        for micros in (0..500).step_by(10) {
            let first = reservation(&restaurant.id, Some(&t1.id), 19, 0, 120);
            let _ = tokio::time::timeout(Duration::from_micros(micros), repo.insert_checked(&first, 15)).await;

            let second = reservation(&restaurant.id, Some(&t2.id), 19, 0, 120);
            let outcome = repo.insert_checked(&second, 15).await;
            assert!(
                matches!(outcome, Ok(BookingOutcome::Booked)),
                "booking after a {micros}us deadline: {outcome:?}"
            );

            repo.delete(&first.id).await.unwrap();
            repo.delete(&second.id).await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checked_inserts_book_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("seatwise.db")).max_connections(8))
            .await
            .unwrap();
        let restaurant = seed_restaurant(&db).await;
        let t = table(&restaurant.id, "1", 2);
        db.tables().insert(&t).await.unwrap();

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let repo = db.reservations();
                let r = reservation(&restaurant.id, Some(&t.id), 19, i * 5, 90);
                tokio::spawn(async move { repo.insert_checked(&r, 15).await })
            })
            .collect();

        let mut booked = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_booked() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);

        let stored = db
            .reservations()
            .list(&ReservationFilter::occupying(&restaurant.id, friday()))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_list_filter_combinations() {
        let (db, restaurant) = db_with_restaurant().await;
        let t = table(&restaurant.id, "1", 4);
        db.tables().insert(&t).await.unwrap();
        let repo = db.reservations();

        let assigned = reservation(&restaurant.id, Some(&t.id), 18, 0, 60);
        let walk_in = reservation(&restaurant.id, None, 20, 0, 60);
        let mut done = reservation(&restaurant.id, Some(&t.id), 17, 0, 60);
        done.date = friday().pred_opt().unwrap();
        done.status = ReservationStatus::Completed;
        for r in [&assigned, &walk_in, &done] {
            repo.insert(r).await.unwrap();
        }

        let occupying = repo
            .list(&ReservationFilter::occupying(&restaurant.id, friday()))
            .await
            .unwrap();
        assert_eq!(occupying.len(), 2);
        assert_eq!(occupying[0].id, assigned.id);

        let unassigned = repo
            .list(&ReservationFilter::for_restaurant(&restaurant.id).on(friday()).unassigned())
            .await
            .unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, walk_in.id);

        let completed = repo
            .completed_between(&restaurant.id, friday() - chrono::Duration::days(7), friday())
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);

        let none = repo
            .list(&ReservationFilter::for_restaurant(&restaurant.id).with_statuses(&[]))
            .await
            .unwrap();
        assert!(none.is_empty());

        let excluded = repo
            .list(
                &ReservationFilter::for_restaurant(&restaurant.id)
                    .on_table(Some(t.id.clone()))
                    .excluding(Some(assigned.id.clone())),
            )
            .await
            .unwrap();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].id, done.id);
    }

    #[tokio::test]
    async fn test_delete_and_missing_update() {
        let (db, restaurant) = db_with_restaurant().await;
        let repo = db.reservations();
        let r = reservation(&restaurant.id, None, 18, 0, 60);

        assert!(matches!(repo.update(&r).await, Err(DbError::NotFound { .. })));

        repo.insert(&r).await.unwrap();
        assert!(repo.delete(&r.id).await.unwrap());
        assert!(!repo.delete(&r.id).await.unwrap());
    }
}
