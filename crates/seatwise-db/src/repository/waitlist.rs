//! # Waitlist Repository
//!
//! Waitlist entries and their queue positions.
//!
//! Positions are computed in seatwise-core and written back here as one
//! batch, so readers never observe a half-renumbered queue.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use seatwise_core::filter::WaitlistFilter;
use seatwise_core::waitlist::PositionUpdate;
use seatwise_core::WaitlistEntry;

const WAITLIST_COLUMNS: &str = "id, restaurant_id, table_id, reservation_id, \
     customer_name, customer_phone, customer_email, party_size, priority, \
     position, estimated_wait_minutes, status, notification_count, \
     last_notified_at, seated_at, cancelled_at, notes, created_at, updated_at";

/// Repository for waitlist database operations.
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    pool: SqlitePool,
}

impl WaitlistRepository {
    /// Creates a new WaitlistRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WaitlistRepository { pool }
    }

    /// Gets an entry by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<WaitlistEntry>> {
        let sql = format!("SELECT {WAITLIST_COLUMNS} FROM waitlist_entries WHERE id = ?1");
        let entry = sqlx::query_as::<_, WaitlistEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Lists entries matching `filter` in queue order.
    ///
    /// Positioned entries come first by position; the rest follow by arrival.
    pub async fn list(&self, filter: &WaitlistFilter) -> DbResult<Vec<WaitlistEntry>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist_entries WHERE restaurant_id = "
        ));
        qb.push_bind(filter.restaurant_id.clone());

        if let Some(statuses) = &filter.status_in {
            if statuses.is_empty() {
                qb.push(" AND 0");
            } else {
                qb.push(" AND status IN (");
                let mut separated = qb.separated(", ");
                for status in statuses {
                    separated.push_bind(*status);
                }
                separated.push_unseparated(")");
            }
        }
        qb.push(" ORDER BY position IS NULL, position, created_at");

        let entries = qb.build_query_as::<WaitlistEntry>().fetch_all(&self.pool).await?;

        debug!(restaurant_id = %filter.restaurant_id, count = entries.len(), "Listed waitlist");
        Ok(entries)
    }

    /// Inserts a new entry.
    pub async fn insert(&self, entry: &WaitlistEntry) -> DbResult<()> {
        debug!(id = %entry.id, party_size = entry.party_size, priority = entry.priority, "Adding to waitlist");

        sqlx::query(
            r#"
            INSERT INTO waitlist_entries (
                restaurant_id, table_id, reservation_id,
                customer_name, customer_phone, customer_email,
                party_size, priority, position, estimated_wait_minutes,
                status, notification_count, last_notified_at, seated_at,
                cancelled_at, notes, created_at, updated_at, id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
        )
        .bind(&entry.restaurant_id)
        .bind(&entry.table_id)
        .bind(&entry.reservation_id)
        .bind(&entry.customer_name)
        .bind(&entry.customer_phone)
        .bind(&entry.customer_email)
        .bind(entry.party_size)
        .bind(entry.priority)
        .bind(entry.position)
        .bind(entry.estimated_wait_minutes)
        .bind(entry.status)
        .bind(entry.notification_count)
        .bind(entry.last_notified_at)
        .bind(entry.seated_at)
        .bind(entry.cancelled_at)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(&entry.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces every mutable column of an existing entry.
    pub async fn update(&self, entry: &WaitlistEntry) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE waitlist_entries SET
                table_id = ?1, reservation_id = ?2,
                customer_name = ?3, customer_phone = ?4, customer_email = ?5,
                party_size = ?6, priority = ?7, position = ?8, estimated_wait_minutes = ?9,
                status = ?10, notification_count = ?11, last_notified_at = ?12,
                seated_at = ?13, cancelled_at = ?14, notes = ?15, updated_at = ?16
            WHERE id = ?17
            "#,
        )
        .bind(&entry.table_id)
        .bind(&entry.reservation_id)
        .bind(&entry.customer_name)
        .bind(&entry.customer_phone)
        .bind(&entry.customer_email)
        .bind(entry.party_size)
        .bind(entry.priority)
        .bind(entry.position)
        .bind(entry.estimated_wait_minutes)
        .bind(entry.status)
        .bind(entry.notification_count)
        .bind(entry.last_notified_at)
        .bind(entry.seated_at)
        .bind(entry.cancelled_at)
        .bind(&entry.notes)
        .bind(entry.updated_at)
        .bind(&entry.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("WaitlistEntry", &entry.id));
        }
        Ok(())
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM waitlist_entries WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes a full set of positions in one transaction.
    ///
    /// Every update must name an entry of `restaurant_id`; otherwise
    /// nothing is written.
    pub async fn write_positions(&self, restaurant_id: &str, updates: &[PositionUpdate]) -> DbResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for update in updates {
            let result = sqlx::query(
                "UPDATE waitlist_entries SET position = ?1 WHERE id = ?2 AND restaurant_id = ?3",
            )
            .bind(update.position)
            .bind(&update.entry_id)
            .bind(restaurant_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping `tx` rolls back the rows already touched
                return Err(DbError::not_found("WaitlistEntry", &update.entry_id));
            }
        }

        tx.commit().await?;

        debug!(restaurant_id = %restaurant_id, count = updates.len(), "Wrote waitlist positions");
        Ok(())
    }
}
