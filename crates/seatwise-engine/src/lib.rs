//! # seatwise-engine: Reservation Engine for Seatwise
//!
//! Orchestrates the pure scheduling logic of `seatwise-core` over an
//! injected store. The routing layer (HTTP, auth, push fan-out) calls into
//! [`Engine`] and forwards the domain events it emits.
//!
//! ## Module Organization
//! ```text
//! seatwise_engine/
//! ├── lib.rs          ◄─── You are here (Engine bundle, tracing init)
//! ├── service/
//! │   ├── mod.rs      ◄─── Shared state of the services
//! │   ├── reservation.rs ◄ validate, availability, optimizer, lifecycle
//! │   ├── waitlist.rs ◄─── enqueue, estimates, staff actions, promote
//! │   └── schedule.rs ◄─── time slots, day/week summaries, peak hours
//! ├── store/
//! │   ├── mod.rs      ◄─── BookingStore trait
//! │   ├── memory.rs   ◄─── MemoryStore
//! │   └── sqlite.rs   ◄─── BookingStore for seatwise_db::Database
//! ├── context.rs      ◄─── RequestContext (deadline), Clock
//! ├── events.rs       ◄─── EventPublisher (bounded mpsc)
//! ├── locks.rs        ◄─── Per-restaurant async locks
//! ├── config.rs       ◄─── EngineConfig (TOML + env)
//! └── error.rs        ◄─── EngineError
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seatwise_engine::{Engine, EngineConfig, RequestContext};
//!
//! let (engine, mut events) = Engine::open(EngineConfig::load(None)?).await?;
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         push_to_floor_staff(event).await;
//!     }
//! });
//!
//! let ctx = RequestContext::with_timeout(std::time::Duration::from_secs(2));
//! let table = engine
//!     .reservations
//!     .find_optimal_table(&ctx, &restaurant_id, 4, date, time, 120)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod locks;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use context::{Clock, FixedClock, RequestContext, SystemClock};
pub use error::{EngineError, EngineResult};
pub use events::EventPublisher;
pub use service::{
    EnqueueRequest, NewReservation, Promotion, PromoteOptions, Reschedule, ReservationService,
    ScheduleService, SlotPlan, WaitlistPatch, WaitlistService,
};
pub use store::{BookingStore, MemoryStore, StoreError, StoreResult};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seatwise_core::events::DomainEvent;
use seatwise_db::Database;

use crate::locks::RestaurantLocks;
use crate::service::Shared;

// =============================================================================
// Engine
// =============================================================================

/// The three services over one store, one config and one event channel.
pub struct Engine<S> {
    pub reservations: ReservationService<S>,
    pub waitlist: WaitlistService<S>,
    pub schedule: ScheduleService<S>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Engine {
            reservations: self.reservations.clone(),
            waitlist: self.waitlist.clone(),
            schedule: self.schedule.clone(),
        }
    }
}

impl<S: BookingStore> Engine<S> {
    /// Builds the engine and returns the receiving end of its event channel.
    pub fn new(store: Arc<S>, config: EngineConfig, clock: Arc<dyn Clock>) -> (Self, mpsc::Receiver<DomainEvent>) {
        let (events, rx) = EventPublisher::channel(config.waitlist.event_channel_capacity);
        (Self::with_publisher(store, config, clock, events), rx)
    }

    /// Builds the engine around an existing publisher.
    pub fn with_publisher(store: Arc<S>, config: EngineConfig, clock: Arc<dyn Clock>, events: EventPublisher) -> Self {
        let shared = Arc::new(Shared {
            store,
            config: Arc::new(config),
            events,
            clock,
            locks: RestaurantLocks::new(),
        });

        let reservations = ReservationService::new(Arc::clone(&shared));
        Engine {
            waitlist: WaitlistService::new(Arc::clone(&shared), reservations.clone()),
            schedule: ScheduleService::new(shared),
            reservations,
        }
    }
}

impl Engine<Database> {
    /// Opens (and migrates) the configured SQLite database.
    pub async fn open(config: EngineConfig) -> EngineResult<(Self, mpsc::Receiver<DomainEvent>)> {
        config.validate()?;
        let db = Database::new(config.db_config()?).await?;
        info!("Database connected and migrations applied");
        Ok(Self::new(Arc::new(db), config, Arc::new(SystemClock)))
    }
}

// =============================================================================
// Tracing
// =============================================================================

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` overrides the default `info,seatwise=debug,sqlx=warn`.
/// Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seatwise=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
