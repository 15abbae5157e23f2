//! # Repository Module
//!
//! Database repository implementations for Seatwise.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Engine store adapter                                                  │
//! │       │                                                                 │
//! │       │  db.reservations().list(&ReservationFilter::occupying(..))     │
//! │       ▼                                                                 │
//! │  ReservationRepository                                                 │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list(&self, filter)          ← typed filter → WHERE clause        │
//! │  ├── insert_checked(&self, r, buffer)  ← conflict check + insert       │
//! │  └── update(&self, r)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RestaurantRepository`](restaurant::RestaurantRepository) - Restaurants, settings, hours, blackouts
//! - [`TableRepository`](table::TableRepository) - Table layout
//! - [`ReservationRepository`](reservation::ReservationRepository) - Bookings
//! - [`WaitlistRepository`](waitlist::WaitlistRepository) - Waitlist queue

pub mod reservation;
pub mod restaurant;
pub mod table;
pub mod waitlist;
