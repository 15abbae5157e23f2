//! # seatwise-db: Database Layer for Seatwise
//!
//! This crate provides database access for the reservation engine.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Seatwise Data Flow                               │
//! │                                                                         │
//! │  seatwise-engine (BookingStore for Database)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   seatwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ RestaurantRepo  │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TableRepo       │   │ 001_initial  │  │   │
//! │  │   │ WAL, FKs,     │    │ ReservationRepo │   │  _schema.sql │  │   │
//! │  │   │ busy_timeout  │    │ WaitlistRepo    │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seatwise_db::{Database, DbConfig};
//! use seatwise_core::filter::ReservationFilter;
//!
//! let db = Database::new(DbConfig::new("seatwise.db")).await?;
//!
//! let tonight = db
//!     .reservations()
//!     .list(&ReservationFilter::occupying(&restaurant_id, date))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::reservation::ReservationRepository;
pub use repository::restaurant::RestaurantRepository;
pub use repository::table::TableRepository;
pub use repository::waitlist::WaitlistRepository;
