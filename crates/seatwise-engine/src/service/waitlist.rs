//! # Waitlist Service
//!
//! Walk-in queue: enqueue, estimates, staff actions and promotion to a
//! reservation.
//!
//! ## Queue Mutations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enqueue / update / remove / promote                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  locks.acquire(restaurant) ─── one mutation per restaurant at a time    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write the entry                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reorder: WAITING by priority desc, created_at asc → 1..N               │
//! │       │   store.write_waitlist_positions (one batch)                    │
//! │       ▼                                                                 │
//! │  publish WaitlistReordered + the entry event                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here moves an entry on a timer; every transition is a staff
//! action.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use tracing::{debug, info, warn};
use uuid::Uuid;

use seatwise_core::availability::AvailabilityQuery;
use seatwise_core::events::DomainEvent;
use seatwise_core::filter::{ReservationFilter, TableFilter, WaitlistFilter};
use seatwise_core::validation;
use seatwise_core::waitlist::{self, PositionUpdate, WaitEstimate};
use seatwise_core::{
    CoreError, CustomerInfo, Reservation, ReservationStatus, RestaurantProfile, Table, WaitlistEntry,
    WaitlistStatus,
};

use super::reservation::ReservationService;
use super::Shared;
use crate::context::RequestContext;
use crate::error::EngineResult;
use crate::store::BookingStore;

// =============================================================================
// Requests
// =============================================================================

/// Input of [`WaitlistService::enqueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueRequest {
    pub restaurant_id: String,
    pub party_size: i32,
    /// 1 (lowest) to 10 (highest).
    pub priority: i32,
    pub customer: CustomerInfo,
    pub notes: Option<String>,
}

/// Partial update of an entry. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitlistPatch {
    pub party_size: Option<i32>,
    pub priority: Option<i32>,
    pub notes: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    /// SEATED is only reachable through [`WaitlistService::promote`].
    pub status: Option<WaitlistStatus>,
}

/// Where and when a promoted party sits down.
///
/// Unset fields mean: the optimizer's table, today, now (restaurant-local),
/// the restaurant's default duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromoteOptions {
    pub table_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
}

/// Result of a promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub reservation: Reservation,
    pub entry: WaitlistEntry,
}

// =============================================================================
// Service
// =============================================================================

/// Waitlist operations over a [`BookingStore`].
pub struct WaitlistService<S> {
    shared: Arc<Shared<S>>,
    reservations: ReservationService<S>,
}

impl<S> Clone for WaitlistService<S> {
    fn clone(&self) -> Self {
        WaitlistService {
            shared: Arc::clone(&self.shared),
            reservations: self.reservations.clone(),
        }
    }
}

impl<S: BookingStore> WaitlistService<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>, reservations: ReservationService<S>) -> Self {
        WaitlistService { shared, reservations }
    }

    /// Adds a party to the end of the queue, then lets priority reorder it.
    ///
    /// A failed estimate leaves `estimated_wait_minutes` empty; it never
    /// fails the enqueue.
    pub async fn enqueue(&self, ctx: &RequestContext, req: EnqueueRequest) -> EngineResult<WaitlistEntry> {
        debug!(
            restaurant_id = %req.restaurant_id,
            party_size = req.party_size,
            priority = req.priority,
            "enqueue"
        );

        validation::validate_customer_name(&req.customer.name).map_err(CoreError::from)?;
        validation::validate_email(req.customer.email.as_deref()).map_err(CoreError::from)?;
        validation::validate_notes("notes", req.notes.as_deref()).map_err(CoreError::from)?;
        validation::validate_party_size(req.party_size).map_err(CoreError::from)?;
        validation::validate_priority(req.priority).map_err(CoreError::from)?;

        let profile = self.shared.active_profile(ctx, &req.restaurant_id).await?;
        let _guard = self.shared.locks.acquire(&req.restaurant_id).await;

        let waiting = ctx
            .store(
                "waitlist_entries",
                self.shared.store.waitlist_entries(&WaitlistFilter::waiting(&req.restaurant_id)),
            )
            .await?;

        let estimated_wait_minutes = match self.estimate(ctx, &profile, req.party_size, &waiting, None).await {
            Ok(estimate) => estimate.minutes,
            Err(e) => {
                warn!(restaurant_id = %req.restaurant_id, error = %e, "Wait estimate unavailable");
                None
            }
        };

        let now = self.shared.now();
        let mut entry = WaitlistEntry {
            id: Uuid::new_v4().to_string(),
            restaurant_id: req.restaurant_id,
            table_id: None,
            reservation_id: None,
            customer_name: req.customer.name.trim().to_string(),
            customer_phone: req.customer.phone,
            customer_email: req.customer.email,
            party_size: req.party_size,
            priority: req.priority,
            position: Some(waitlist::next_position(&waiting)),
            estimated_wait_minutes,
            status: WaitlistStatus::Waiting,
            notification_count: 0,
            last_notified_at: None,
            seated_at: None,
            cancelled_at: None,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };

        ctx.store("insert_waitlist_entry", self.shared.store.insert_waitlist_entry(&entry))
            .await?;

        let positions = self.reorder(ctx, &entry.restaurant_id).await?;
        waitlist::apply_positions(std::slice::from_mut(&mut entry), &positions);

        info!(
            entry_id = %entry.id,
            restaurant_id = %entry.restaurant_id,
            position = ?entry.position,
            estimated_wait = ?entry.estimated_wait_minutes,
            "Party added to waitlist"
        );
        self.shared
            .events
            .publish(DomainEvent::WaitlistEntryAdded(entry.clone()));

        Ok(entry)
    }

    /// How long a new party of `party_size` would wait right now.
    pub async fn estimate_wait(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        party_size: i32,
    ) -> EngineResult<WaitEstimate> {
        validation::validate_party_size(party_size).map_err(CoreError::from)?;
        let profile = self.shared.profile(ctx, restaurant_id).await?;
        let waiting = ctx
            .store(
                "waitlist_entries",
                self.shared.store.waitlist_entries(&WaitlistFilter::waiting(restaurant_id)),
            )
            .await?;
        self.estimate(ctx, &profile, party_size, &waiting, None).await
    }

    pub async fn get_entry(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<WaitlistEntry> {
        self.load(ctx, entry_id).await
    }

    /// WAITING entries in queue order.
    pub async fn list_waiting(&self, ctx: &RequestContext, restaurant_id: &str) -> EngineResult<Vec<WaitlistEntry>> {
        ctx.store(
            "waitlist_entries",
            self.shared.store.waitlist_entries(&WaitlistFilter::waiting(restaurant_id)),
        )
        .await
    }

    /// Applies `patch`; reorders when priority changes or the entry leaves
    /// WAITING.
    pub async fn update_entry(
        &self,
        ctx: &RequestContext,
        entry_id: &str,
        patch: WaitlistPatch,
    ) -> EngineResult<WaitlistEntry> {
        debug!(entry_id, ?patch, "update_waitlist_entry");

        if let Some(name) = patch.customer_name.as_deref() {
            validation::validate_customer_name(name).map_err(CoreError::from)?;
        }
        validation::validate_email(patch.customer_email.as_deref()).map_err(CoreError::from)?;
        validation::validate_notes("notes", patch.notes.as_deref()).map_err(CoreError::from)?;
        if let Some(size) = patch.party_size {
            validation::validate_party_size(size).map_err(CoreError::from)?;
        }
        if let Some(priority) = patch.priority {
            validation::validate_priority(priority).map_err(CoreError::from)?;
        }

        let restaurant_id = self.load(ctx, entry_id).await?.restaurant_id;
        let _guard = self.shared.locks.acquire(&restaurant_id).await;
        let mut entry = self.load(ctx, entry_id).await?;
        let before = entry.clone();

        if let Some(next) = patch.status {
            let unchanged = next == entry.status && next != WaitlistStatus::Notified;
            if !unchanged {
                if next == WaitlistStatus::Seated || !entry.status.can_transition_to(next) {
                    return Err(CoreError::InvalidWaitlistTransition {
                        id: entry.id,
                        from: entry.status.to_string(),
                        to: next.to_string(),
                    }
                    .into());
                }
                entry.apply_status(next, self.shared.now());
            }
        }

        if let Some(size) = patch.party_size {
            entry.party_size = size;
        }
        if let Some(priority) = patch.priority {
            entry.priority = priority;
        }
        if let Some(notes) = patch.notes {
            entry.notes = Some(notes);
        }
        if let Some(name) = patch.customer_name {
            entry.customer_name = name.trim().to_string();
        }
        if let Some(phone) = patch.customer_phone {
            entry.customer_phone = Some(phone);
        }
        if let Some(email) = patch.customer_email {
            entry.customer_email = Some(email);
        }
        entry.updated_at = self.shared.now();

        if entry.party_size != before.party_size && entry.status == WaitlistStatus::Waiting {
            entry.estimated_wait_minutes = self.best_effort_estimate(ctx, &entry).await;
        }

        ctx.store("update_waitlist_entry", self.shared.store.update_waitlist_entry(&entry))
            .await?;

        let left_waiting = before.status == WaitlistStatus::Waiting && entry.status != WaitlistStatus::Waiting;
        if left_waiting || entry.priority != before.priority {
            let positions = self.reorder(ctx, &restaurant_id).await?;
            waitlist::apply_positions(std::slice::from_mut(&mut entry), &positions);
        }

        let notified = entry.status == WaitlistStatus::Notified && entry.notification_count > before.notification_count;
        info!(
            entry_id = %entry.id,
            status = %entry.status,
            position = ?entry.position,
            "Waitlist entry updated"
        );
        let event = if notified {
            DomainEvent::WaitlistEntryNotified(entry.clone())
        } else {
            DomainEvent::WaitlistEntryUpdated(entry.clone())
        };
        self.shared.events.publish(event);

        Ok(entry)
    }

    /// Calls the party. Repeat calls count up.
    pub async fn notify(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<WaitlistEntry> {
        self.set_status(ctx, entry_id, WaitlistStatus::Notified).await
    }

    pub async fn cancel(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<WaitlistEntry> {
        self.set_status(ctx, entry_id, WaitlistStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<WaitlistEntry> {
        self.set_status(ctx, entry_id, WaitlistStatus::NoShow).await
    }

    /// Hard delete, then close the gap in the queue.
    pub async fn remove(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<()> {
        let restaurant_id = self.load(ctx, entry_id).await?.restaurant_id;
        let _guard = self.shared.locks.acquire(&restaurant_id).await;

        let removed = ctx
            .store("delete_waitlist_entry", self.shared.store.delete_waitlist_entry(entry_id))
            .await?;
        if !removed {
            return Err(CoreError::WaitlistEntryNotFound(entry_id.to_string()).into());
        }

        self.reorder(ctx, &restaurant_id).await?;
        info!(entry_id, restaurant_id = %restaurant_id, "Waitlist entry removed");
        Ok(())
    }

    /// Recomputes the estimate of every WAITING entry.
    ///
    /// Each entry is compared against the others, never against itself.
    pub async fn refresh_estimates(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
    ) -> EngineResult<Vec<WaitlistEntry>> {
        let profile = self.shared.profile(ctx, restaurant_id).await?;
        let _guard = self.shared.locks.acquire(restaurant_id).await;

        let mut waiting = ctx
            .store(
                "waitlist_entries",
                self.shared.store.waitlist_entries(&WaitlistFilter::waiting(restaurant_id)),
            )
            .await?;
        let (tables, completed) = self.estimate_inputs(ctx, &profile).await?;
        let policy = &self.shared.config.waitlist.policy;

        let snapshot = waiting.clone();
        let mut changed = 0;
        for entry in waiting.iter_mut() {
            let estimate =
                waitlist::estimate_for_party(entry.party_size, &snapshot, &tables, &completed, policy, Some(entry.id.as_str()));
            if estimate.minutes == entry.estimated_wait_minutes {
                continue;
            }
            entry.estimated_wait_minutes = estimate.minutes;
            entry.updated_at = self.shared.now();
            ctx.store("update_waitlist_entry", self.shared.store.update_waitlist_entry(entry))
                .await?;
            self.shared
                .events
                .publish(DomainEvent::WaitlistEntryUpdated(entry.clone()));
            changed += 1;
        }

        debug!(restaurant_id, entries = waiting.len(), changed, "Refreshed wait estimates");
        Ok(waiting)
    }

    /// Seats a waiting party: books a CONFIRMED reservation and marks the
    /// entry SEATED.
    ///
    /// Business rules are not re-run (the party is standing at the host
    /// stand), but the table is always conflict-checked.
    pub async fn promote(
        &self,
        ctx: &RequestContext,
        entry_id: &str,
        options: PromoteOptions,
    ) -> EngineResult<Promotion> {
        debug!(entry_id, ?options, "promote_waitlist_entry");

        let restaurant_id = self.load(ctx, entry_id).await?.restaurant_id;
        let profile = self.shared.active_profile(ctx, &restaurant_id).await?;
        let _guard = self.shared.locks.acquire(&restaurant_id).await;

        let mut entry = self.load(ctx, entry_id).await?;
        if !entry.status.is_open() {
            return Err(CoreError::InvalidWaitlistTransition {
                id: entry.id,
                from: entry.status.to_string(),
                to: WaitlistStatus::Seated.to_string(),
            }
            .into());
        }

        let local_now = self.shared.local_now(&profile);
        let date = options.date.unwrap_or(local_now.date());
        let time = options.time.unwrap_or_else(|| {
            let t = local_now.time();
            NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
        });
        let duration = options
            .duration_minutes
            .unwrap_or(profile.settings.default_reservation_duration);
        validation::validate_duration(duration).map_err(CoreError::from)?;

        let table_id = match options.table_id {
            Some(table_id) => match ctx.store("table", self.shared.store.table(&table_id)).await? {
                Some(t) if t.restaurant_id == restaurant_id && t.is_active => t.id,
                _ => return Err(CoreError::TableNotFound(table_id).into()),
            },
            None => {
                let query = AvailabilityQuery::new(date, time, duration, entry.party_size);
                self.reservations
                    .recommend_table(ctx, &restaurant_id, &query)
                    .await?
                    .map(|a| a.table.id)
                    .ok_or(CoreError::NoTableAvailable {
                        party_size: entry.party_size,
                    })?
            }
        };

        let now = self.shared.now();
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.clone(),
            table_id: Some(table_id.clone()),
            waitlist_entry_id: Some(entry.id.clone()),
            customer_name: entry.customer_name.clone(),
            customer_phone: entry.customer_phone.clone(),
            customer_email: entry.customer_email.clone(),
            party_size: entry.party_size,
            date,
            time,
            duration_minutes: duration,
            status: ReservationStatus::Confirmed,
            special_requests: entry.notes.clone(),
            created_at: now,
            updated_at: now,
            confirmed_at: Some(now),
            arrived_at: None,
            seated_at: None,
            completed_at: None,
            cancelled_at: None,
        };
        self.reservations.book(ctx, &reservation).await?;

        let was_waiting = entry.status == WaitlistStatus::Waiting;
        entry.apply_status(WaitlistStatus::Seated, now);
        entry.table_id = Some(table_id);
        entry.reservation_id = Some(reservation.id.clone());

        if let Err(e) = ctx
            .store("update_waitlist_entry", self.shared.store.update_waitlist_entry(&entry))
            .await
        {
            // Undo the booking so the table is not held for a party still in line.
            match self.shared.store.delete_reservation(&reservation.id).await {
                Ok(_) => debug!(reservation_id = %reservation.id, "Rolled back promotion booking"),
                Err(rollback) => warn!(
                    reservation_id = %reservation.id,
                    error = %rollback,
                    "Failed to roll back promotion booking"
                ),
            }
            return Err(e);
        }

        if was_waiting {
            self.reorder(ctx, &restaurant_id).await?;
        }

        info!(
            entry_id = %entry.id,
            reservation_id = %reservation.id,
            table_id = ?reservation.table_id,
            "Waitlist entry promoted"
        );
        self.shared
            .events
            .publish(DomainEvent::ReservationCreated(reservation.clone()));
        self.shared.events.publish(DomainEvent::WaitlistEntryPromoted {
            entry: entry.clone(),
            reservation: reservation.clone(),
        });

        Ok(Promotion { reservation, entry })
    }

    // ---- Internals ----

    async fn set_status(&self, ctx: &RequestContext, entry_id: &str, next: WaitlistStatus) -> EngineResult<WaitlistEntry> {
        self.update_entry(
            ctx,
            entry_id,
            WaitlistPatch {
                status: Some(next),
                ..Default::default()
            },
        )
        .await
    }

    async fn load(&self, ctx: &RequestContext, entry_id: &str) -> EngineResult<WaitlistEntry> {
        ctx.store("waitlist_entry", self.shared.store.waitlist_entry(entry_id))
            .await?
            .ok_or_else(|| CoreError::WaitlistEntryNotFound(entry_id.to_string()).into())
    }

    /// Rewrites WAITING positions as one batch. The caller holds the
    /// restaurant lock.
    async fn reorder(&self, ctx: &RequestContext, restaurant_id: &str) -> EngineResult<Vec<PositionUpdate>> {
        let waiting = ctx
            .store(
                "waitlist_entries",
                self.shared.store.waitlist_entries(&WaitlistFilter::waiting(restaurant_id)),
            )
            .await?;
        let positions = waitlist::assign_positions(&waiting);

        if !positions.is_empty() {
            ctx.store(
                "write_waitlist_positions",
                self.shared.store.write_waitlist_positions(restaurant_id, &positions),
            )
            .await?;
        }

        debug!(restaurant_id, waiting = positions.len(), "Waitlist reordered");
        self.shared.events.publish(DomainEvent::WaitlistReordered {
            restaurant_id: restaurant_id.to_string(),
            positions: positions.clone(),
        });

        Ok(positions)
    }

    async fn estimate(
        &self,
        ctx: &RequestContext,
        profile: &RestaurantProfile,
        party_size: i32,
        waiting: &[WaitlistEntry],
        exclude_id: Option<&str>,
    ) -> EngineResult<WaitEstimate> {
        let (tables, completed) = self.estimate_inputs(ctx, profile).await?;
        Ok(waitlist::estimate_for_party(
            party_size,
            waiting,
            &tables,
            &completed,
            &self.shared.config.waitlist.policy,
            exclude_id,
        ))
    }

    /// Active tables and the reservations completed in the trailing
    /// lookback window.
    ///
    /// Rows carry `completed_at` when staff closed them; older rows without
    /// it fall back to their booking date.
    async fn estimate_inputs(
        &self,
        ctx: &RequestContext,
        profile: &RestaurantProfile,
    ) -> EngineResult<(Vec<Table>, Vec<Reservation>)> {
        let restaurant_id = profile.restaurant.id.as_str();
        let lookback = Duration::days(self.shared.config.waitlist.policy.turnover_lookback_days);
        let cutoff = self.shared.now() - lookback;
        let today = self.shared.local_now(profile).date();
        let from = today - lookback;

        let tables = ctx
            .store("tables", self.shared.store.tables(&TableFilter::active(restaurant_id)))
            .await?;
        // One extra day catches late sittings that finished after midnight.
        let mut completed = ctx
            .store(
                "completed_reservations",
                self.shared.store.reservations(
                    &ReservationFilter::for_restaurant(restaurant_id)
                        .between(from - Duration::days(1), today)
                        .with_statuses(&[ReservationStatus::Completed]),
                ),
            )
            .await?;
        completed.retain(|r| match r.completed_at {
            Some(at) => at >= cutoff,
            None => r.date >= from,
        });

        Ok((tables, completed))
    }

    async fn best_effort_estimate(&self, ctx: &RequestContext, entry: &WaitlistEntry) -> Option<i32> {
        let result = async {
            let profile = self.shared.profile(ctx, &entry.restaurant_id).await?;
            let waiting = ctx
                .store(
                    "waitlist_entries",
                    self.shared.store.waitlist_entries(&WaitlistFilter::waiting(&entry.restaurant_id)),
                )
                .await?;
            self.estimate(ctx, &profile, entry.party_size, &waiting, Some(entry.id.as_str()))
                .await
        }
        .await;

        match result {
            Ok(estimate) => estimate.minutes,
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "Wait estimate unavailable");
                entry.estimated_wait_minutes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testing::{booking, dinner_profile, engine_with, friday, hm, table, today, RESTAURANT};
    use std::collections::HashSet;

    fn walk_in(name: &str, party_size: i32, priority: i32) -> EnqueueRequest {
        EnqueueRequest {
            restaurant_id: RESTAURANT.into(),
            party_size,
            priority,
            customer: CustomerInfo {
                name: name.into(),
                phone: Some("555-0100".into()),
                email: None,
            },
            notes: None,
        }
    }

    async fn positions(svc: &WaitlistService<crate::store::MemoryStore>) -> Vec<(String, Option<i32>)> {
        svc.list_waiting(&RequestContext::background(), RESTAURANT)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.customer_name, e.position))
            .collect()
    }

    #[tokio::test]
    async fn test_higher_priority_moves_ahead() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        let ctx = RequestContext::background();

        let low = engine.waitlist.enqueue(&ctx, walk_in("Low", 2, 3)).await.unwrap();
        assert_eq!(low.position, Some(1));

        let high = engine.waitlist.enqueue(&ctx, walk_in("High", 2, 9)).await.unwrap();
        assert_eq!(high.position, Some(1));

        assert_eq!(
            positions(&engine.waitlist).await,
            vec![("High".to_string(), Some(1)), ("Low".to_string(), Some(2))]
        );
    }

    #[tokio::test]
    async fn test_oversized_party_waits_with_an_estimate() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        for (id, cap) in [("t2", 2), ("t4", 4), ("t10", 10)] {
            store.put_table(table(id, id, cap)).await;
        }
        let ctx = RequestContext::background();

        let table = engine
            .reservations
            .find_optimal_table(&ctx, RESTAURANT, 12, friday(), hm(19, 0), 120)
            .await
            .unwrap();
        assert!(table.is_none());

        let entry = engine.waitlist.enqueue(&ctx, walk_in("Big group", 12, 5)).await.unwrap();
        let minutes = entry.estimated_wait_minutes.unwrap();
        assert!(minutes > 0 && minutes <= 240);
    }

    #[tokio::test]
    async fn test_estimate_uses_completed_history() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;

        // Seated at 18:00, done at 19:00 two days before "today".
        let mut done = booking("done", Some("t4"), hm(18, 0), 90);
        done.date = today() - Duration::days(2);
        done.status = ReservationStatus::Completed;
        let seated = done.date.and_time(hm(18, 0)).and_utc();
        done.seated_at = Some(seated);
        done.completed_at = Some(seated + Duration::minutes(60));
        store.put_reservation(done).await;

        let estimate = engine
            .waitlist
            .estimate_wait(&RequestContext::background(), RESTAURANT, 4)
            .await
            .unwrap();
        assert_eq!(estimate.average_turnover_minutes, 60.0);
        assert_eq!(estimate.minutes, Some(60));
    }

    #[tokio::test]
    async fn test_turnover_window_follows_completion_time() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;

        // Lunch on the first day of the window, finished before the cutoff
        // (now - 7 days, 12:00).
        let mut early = booking("early", Some("t4"), hm(10, 0), 90);
        early.date = today() - Duration::days(7);
        early.status = ReservationStatus::Completed;
        let seated = early.date.and_time(hm(10, 0)).and_utc();
        early.seated_at = Some(seated);
        early.completed_at = Some(seated + Duration::minutes(60));
        store.put_reservation(early).await;

        let mut recent = booking("recent", Some("t4"), hm(18, 0), 120);
        recent.date = today() - Duration::days(5);
        recent.status = ReservationStatus::Completed;
        let seated = recent.date.and_time(hm(18, 0)).and_utc();
        recent.seated_at = Some(seated);
        recent.completed_at = Some(seated + Duration::minutes(90));
        store.put_reservation(recent).await;

        let estimate = engine
            .waitlist
            .estimate_wait(&RequestContext::background(), RESTAURANT, 4)
            .await
            .unwrap();
        assert_eq!(estimate.average_turnover_minutes, 90.0);
    }

    #[tokio::test]
    async fn test_enqueue_survives_a_failed_estimate() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        let ctx = RequestContext::background();
        let svc = &engine.waitlist;

        let first = svc.enqueue(&ctx, walk_in("First", 2, 5)).await.unwrap();
        assert_eq!(first.estimated_wait_minutes, Some(120));

        store.fail_operation("tables").await;
        let urgent = svc.enqueue(&ctx, walk_in("Urgent", 2, 9)).await.unwrap();
        assert_eq!(urgent.estimated_wait_minutes, None);
        assert_eq!(urgent.position, Some(1));

        let queue = svc.list_waiting(&ctx, RESTAURANT).await.unwrap();
        let order: Vec<(&str, Option<i32>)> = queue.iter().map(|e| (e.id.as_str(), e.position)).collect();
        assert_eq!(order, vec![(urgent.id.as_str(), Some(1)), (first.id.as_str(), Some(2))]);

        // A party-size change keeps the last known estimate.
        let resized = svc
            .update_entry(
                &ctx,
                &first.id,
                WaitlistPatch {
                    party_size: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resized.party_size, 3);
        assert_eq!(resized.estimated_wait_minutes, Some(120));

        // Staff-driven refresh reports the outage instead of guessing.
        assert!(svc.refresh_estimates(&ctx, RESTAURANT).await.unwrap_err().is_unexpected());

        store.restore_operation("tables").await;
        let refreshed = svc.refresh_estimates(&ctx, RESTAURANT).await.unwrap();
        assert!(refreshed.iter().all(|e| e.estimated_wait_minutes.is_some()));
    }

    #[tokio::test]
    async fn test_positions_stay_dense_through_staff_actions() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        let ctx = RequestContext::background();
        let svc = &engine.waitlist;

        let mut ids = Vec::new();
        for (i, priority) in [5, 2, 8, 5, 1, 10].into_iter().enumerate() {
            let entry = svc.enqueue(&ctx, walk_in(&format!("P{i}"), 2, priority)).await.unwrap();
            ids.push(entry.id);
        }

        svc.cancel(&ctx, &ids[0]).await.unwrap();
        svc.notify(&ctx, &ids[2]).await.unwrap();
        svc.mark_no_show(&ctx, &ids[4]).await.unwrap();
        svc.update_entry(
            &ctx,
            &ids[1],
            WaitlistPatch {
                priority: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.remove(&ctx, &ids[5]).await.unwrap();

        let waiting = svc.list_waiting(&ctx, RESTAURANT).await.unwrap();
        let got: HashSet<i32> = waiting.iter().filter_map(|e| e.position).collect();
        let want: HashSet<i32> = (1..=waiting.len() as i32).collect();
        assert_eq!(got, want);
        assert_eq!(waiting.len(), 2);
        assert_eq!(waiting[0].id, ids[1]);

        let cancelled = svc.get_entry(&ctx, &ids[0]).await.unwrap();
        assert_eq!(cancelled.position, None);
        assert!(cancelled.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_notify_counts_and_seated_needs_promote() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        let ctx = RequestContext::background();
        let svc = &engine.waitlist;

        let entry = svc.enqueue(&ctx, walk_in("Ada", 2, 5)).await.unwrap();
        svc.notify(&ctx, &entry.id).await.unwrap();
        let again = svc.notify(&ctx, &entry.id).await.unwrap();
        assert_eq!(again.status, WaitlistStatus::Notified);
        assert_eq!(again.notification_count, 2);
        assert!(again.last_notified_at.is_some());

        let err = svc
            .update_entry(
                &ctx,
                &entry.id,
                WaitlistPatch {
                    status: Some(WaitlistStatus::Seated),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidWaitlistTransition { .. })));

        svc.cancel(&ctx, &entry.id).await.unwrap();
        let err = svc.notify(&ctx, &entry.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidWaitlistTransition { .. })));
    }

    #[tokio::test]
    async fn test_promote_books_and_seats() {
        let (engine, store, mut rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t2", "1", 2)).await;
        store.put_table(table("t4", "2", 4)).await;
        let ctx = RequestContext::background();

        let first = engine.waitlist.enqueue(&ctx, walk_in("First", 4, 5)).await.unwrap();
        let second = engine.waitlist.enqueue(&ctx, walk_in("Second", 2, 5)).await.unwrap();
        while rx.try_recv().is_ok() {}

        let promotion = engine
            .waitlist
            .promote(
                &ctx,
                &first.id,
                PromoteOptions {
                    date: Some(friday()),
                    time: Some(hm(19, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(promotion.reservation.status, ReservationStatus::Confirmed);
        assert_eq!(promotion.reservation.table_id.as_deref(), Some("t4"));
        assert_eq!(promotion.reservation.waitlist_entry_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(promotion.entry.status, WaitlistStatus::Seated);
        assert_eq!(promotion.entry.position, None);
        assert_eq!(promotion.entry.reservation_id.as_deref(), Some(promotion.reservation.id.as_str()));

        let remaining = engine.waitlist.get_entry(&ctx, &second.id).await.unwrap();
        assert_eq!(remaining.position, Some(1));

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["waitlist_reordered", "reservation_created", "waitlist_entry_promoted"]
        );

        let err = engine
            .waitlist
            .promote(&ctx, &first.id, PromoteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidWaitlistTransition { .. })));
    }

    #[tokio::test]
    async fn test_promote_onto_a_held_table_conflicts() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        store.put_reservation(booking("held", Some("t4"), hm(19, 0), 120)).await;
        let ctx = RequestContext::background();

        let entry = engine.waitlist.enqueue(&ctx, walk_in("Ada", 2, 5)).await.unwrap();
        let err = engine
            .waitlist
            .promote(
                &ctx,
                &entry.id,
                PromoteOptions {
                    table_id: Some("t4".into()),
                    date: Some(friday()),
                    time: Some(hm(20, 0)),
                    duration_minutes: Some(60),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));

        let still = engine.waitlist.get_entry(&ctx, &entry.id).await.unwrap();
        assert_eq!(still.status, WaitlistStatus::Waiting);
        assert_eq!(still.position, Some(1));
    }

    #[tokio::test]
    async fn test_refresh_excludes_each_entry_from_its_own_count() {
        let (engine, store, _rx) = engine_with(dinner_profile()).await;
        store.put_table(table("t4", "1", 4)).await;
        let ctx = RequestContext::background();

        let a = engine.waitlist.enqueue(&ctx, walk_in("A", 2, 5)).await.unwrap();
        let b = engine.waitlist.enqueue(&ctx, walk_in("B", 2, 5)).await.unwrap();
        // No history: 120 minute turnover, one table.
        assert_eq!(a.estimated_wait_minutes, Some(120));
        assert_eq!(b.estimated_wait_minutes, Some(240));

        let refreshed = engine.waitlist.refresh_estimates(&ctx, RESTAURANT).await.unwrap();
        assert!(refreshed.iter().all(|e| e.estimated_wait_minutes == Some(240)));
    }

    #[tokio::test]
    async fn test_enqueue_requires_an_active_restaurant() {
        let mut profile = dinner_profile();
        profile.restaurant.is_active = false;
        let (engine, _store, _rx) = engine_with(profile).await;

        let err = engine
            .waitlist
            .enqueue(&RequestContext::background(), walk_in("Ada", 2, 5))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = engine
            .waitlist
            .enqueue(&RequestContext::background(), walk_in("Ada", 2, 11))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));
    }
}
