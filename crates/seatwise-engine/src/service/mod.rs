//! # Services
//!
//! The engine's operations, grouped by aggregate.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_reservation                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rules::validate ──(invalid)──► ValidationFailed { errors }            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  table given? ──no──► availability::evaluate + assignment::select_table│
//! │       │                      │                                          │
//! │       │                      └──(none)──► NoTableAvailable              │
//! │       ▼                                                                 │
//! │  store.insert_reservation_checked ──(conflicts)──► Conflict            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  publish ReservationCreated                                             │
//! │                                                                         │
//! │  NoTableAvailable → caller may enqueue_waitlist; promotion later runs  │
//! │  the same availability/assignment path.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use seatwise_core::{CoreError, RestaurantProfile};

use crate::config::EngineConfig;
use crate::context::{Clock, RequestContext};
use crate::error::EngineResult;
use crate::events::EventPublisher;
use crate::locks::RestaurantLocks;
use crate::store::BookingStore;

pub mod reservation;
pub mod schedule;
pub mod waitlist;

pub use reservation::{NewReservation, ReservationService, Reschedule};
pub use schedule::{ScheduleService, SlotPlan};
pub use waitlist::{EnqueueRequest, Promotion, PromoteOptions, WaitlistPatch, WaitlistService};

/// Everything the services share.
pub(crate) struct Shared<S> {
    pub store: Arc<S>,
    pub config: Arc<EngineConfig>,
    pub events: EventPublisher,
    pub clock: Arc<dyn Clock>,
    pub locks: RestaurantLocks,
}

impl<S: BookingStore> Shared<S> {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Restaurant-local wall-clock time.
    pub fn local_now(&self, profile: &RestaurantProfile) -> NaiveDateTime {
        profile.restaurant.local_now(self.now())
    }

    /// Loads a restaurant, active or not.
    pub async fn profile(&self, ctx: &RequestContext, restaurant_id: &str) -> EngineResult<RestaurantProfile> {
        ctx.store("restaurant_profile", self.store.restaurant_profile(restaurant_id))
            .await?
            .ok_or_else(|| CoreError::RestaurantNotFound(restaurant_id.to_string()).into())
    }

    /// Loads a restaurant that still takes guests.
    pub async fn active_profile(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
    ) -> EngineResult<RestaurantProfile> {
        let profile = self.profile(ctx, restaurant_id).await?;
        if !profile.restaurant.is_active {
            return Err(CoreError::RestaurantNotFound(restaurant_id.to_string()).into());
        }
        Ok(profile)
    }
}
