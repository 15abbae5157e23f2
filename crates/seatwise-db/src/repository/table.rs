//! # Table Repository
//!
//! Database operations for the floor layout.
//!
//! Tables are soft-deleted: `set_active(id, false)` keeps historic
//! reservations pointing at a real row.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use seatwise_core::filter::TableFilter;
use seatwise_core::Table;

const TABLE_COLUMNS: &str = "id, restaurant_id, table_number, capacity, section, shape, \
     pos_x, pos_y, width, height, is_active, created_at, updated_at";

/// Repository for table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Table>> {
        let sql = format!("SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE id = ?1");
        let table = sqlx::query_as::<_, Table>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(table)
    }

    /// Lists tables matching `filter`, smallest capacity first.
    pub async fn list(&self, filter: &TableFilter) -> DbResult<Vec<Table>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE restaurant_id = "
        ));
        qb.push_bind(filter.restaurant_id.clone());

        if filter.active_only {
            qb.push(" AND is_active = 1");
        }
        if let Some(min) = filter.min_capacity {
            qb.push(" AND capacity >= ").push_bind(min);
        }
        if let Some(section) = &filter.section {
            qb.push(" AND section = ").push_bind(section.clone());
        }
        qb.push(" ORDER BY capacity, table_number");

        let tables = qb.build_query_as::<Table>().fetch_all(&self.pool).await?;

        debug!(restaurant_id = %filter.restaurant_id, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Inserts a new table.
    pub async fn insert(&self, table: &Table) -> DbResult<()> {
        debug!(id = %table.id, table_number = %table.table_number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO restaurant_tables (
                id, restaurant_id, table_number, capacity, section, shape,
                pos_x, pos_y, width, height, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&table.id)
        .bind(&table.restaurant_id)
        .bind(&table.table_number)
        .bind(table.capacity)
        .bind(&table.section)
        .bind(table.shape)
        .bind(table.pos_x)
        .bind(table.pos_y)
        .bind(table.width)
        .bind(table.height)
        .bind(table.is_active)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates layout and capacity of an existing table.
    pub async fn update(&self, table: &Table) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE restaurant_tables SET
                table_number = ?1, capacity = ?2, section = ?3, shape = ?4,
                pos_x = ?5, pos_y = ?6, width = ?7, height = ?8,
                is_active = ?9, updated_at = ?10
            WHERE id = ?11
            "#,
        )
        .bind(&table.table_number)
        .bind(table.capacity)
        .bind(&table.section)
        .bind(table.shape)
        .bind(table.pos_x)
        .bind(table.pos_y)
        .bind(table.width)
        .bind(table.height)
        .bind(table.is_active)
        .bind(table.updated_at)
        .bind(&table.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }
        Ok(())
    }

    /// Soft delete / restore.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE restaurant_tables SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }
        Ok(())
    }
}
