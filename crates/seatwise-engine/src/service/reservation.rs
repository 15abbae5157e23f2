//! # Reservation Service
//!
//! Validation, availability, table recommendation and the reservation
//! lifecycle.
//!
//! ## Lifecycle
//! ```text
//! create ──► PENDING ──► CONFIRMED ──► ARRIVED ──► SEATED ──► COMPLETED
//!    │                      │  (checked)   │           ▲
//!    └──────────────────────┘              └───────────┘
//!
//! PENDING | CONFIRMED | ARRIVED ──► CANCELLED
//! PENDING | CONFIRMED           ──► NO_SHOW
//! ```
//!
//! Every write that can put a party on a table goes through the store's
//! checked insert/update, so two concurrent requests for the same table
//! and window never both succeed.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use seatwise_core::assignment::{self, Assignment, AssignmentRequest};
use seatwise_core::availability::{self, AvailabilityQuery, AvailabilityReport, BookingOutcome};
use seatwise_core::events::DomainEvent;
use seatwise_core::filter::{ReservationFilter, TableFilter};
use seatwise_core::rules::{self, ReservationCandidate, RuleContext, ValidationReport};
use seatwise_core::validation;
use seatwise_core::{CoreError, CustomerInfo, Reservation, ReservationStatus, RestaurantProfile, Table};

use super::Shared;
use crate::context::RequestContext;
use crate::error::{EngineError, EngineResult};
use crate::store::BookingStore;

// =============================================================================
// Requests
// =============================================================================

/// Input of [`ReservationService::create_reservation`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub restaurant_id: String,
    /// `None` lets the optimizer choose.
    pub table_id: Option<String>,
    pub customer: CustomerInfo,
    pub party_size: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// `None` uses the restaurant's default duration.
    pub duration_minutes: Option<i32>,
    pub special_requests: Option<String>,
    /// Create as PENDING instead of CONFIRMED.
    pub pending: bool,
    /// Set when the reservation comes from a waitlist promotion.
    pub waitlist_entry_id: Option<String>,
}

/// Input of [`ReservationService::reschedule_reservation`].
///
/// Unset fields keep the reservation's current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reschedule {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub party_size: Option<i32>,
    pub table_id: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Reservation operations over a [`BookingStore`].
pub struct ReservationService<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for ReservationService<S> {
    fn clone(&self) -> Self {
        ReservationService {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: BookingStore> ReservationService<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>) -> Self {
        ReservationService { shared }
    }

    // ---- Reads ----

    /// Runs every business rule against `candidate`.
    ///
    /// Broken rules come back in the report; only store failures are errors.
    pub async fn validate_reservation(
        &self,
        ctx: &RequestContext,
        candidate: &ReservationCandidate,
    ) -> EngineResult<ValidationReport> {
        let profile = ctx
            .store("restaurant_profile", self.shared.store.restaurant_profile(&candidate.restaurant_id))
            .await?;
        self.rules_report(ctx, candidate, profile.as_ref()).await
    }

    /// Which tables can take the party in the padded window.
    ///
    /// With `query.table_id` set, only that table is examined and it must
    /// belong to `restaurant_id`.
    pub async fn check_availability(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        query: &AvailabilityQuery,
    ) -> EngineResult<AvailabilityReport> {
        let store = &self.shared.store;

        let tables = match query.table_id.as_deref() {
            Some(table_id) => {
                let table = ctx
                    .store("table", store.table(table_id))
                    .await?
                    .filter(|t| t.restaurant_id == restaurant_id)
                    .ok_or_else(|| CoreError::TableNotFound(table_id.to_string()))?;
                vec![table]
            }
            None => {
                ctx.store("tables", store.tables(&TableFilter::active(restaurant_id)))
                    .await?
            }
        };

        let reservations = ctx
            .store(
                "reservations",
                store.reservations(&ReservationFilter::occupying(restaurant_id, query.date)),
            )
            .await?;

        let report = availability::evaluate(&tables, &reservations, query, &self.shared.config.scheduling);
        debug!(
            restaurant_id,
            date = %query.date,
            time = %query.time,
            available = report.is_available,
            tables = report.available_tables.len(),
            "Checked availability"
        );
        Ok(report)
    }

    /// Recommends a free table for the party, or `None`.
    ///
    /// `query.table_id` is ignored; `query.exclude_reservation_id` is kept so
    /// a reservation being moved does not block its own table.
    pub async fn recommend_table(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        query: &AvailabilityQuery,
    ) -> EngineResult<Option<Assignment>> {
        let open_query = AvailabilityQuery {
            table_id: None,
            ..query.clone()
        };
        let report = self.check_availability(ctx, restaurant_id, &open_query).await?;
        if report.available_tables.is_empty() {
            return Ok(None);
        }

        // Future demand only tunes the choice; losing it is not fatal.
        let upcoming = ReservationFilter::for_restaurant(restaurant_id)
            .on(query.date)
            .with_statuses(&ReservationStatus::UPCOMING)
            .unassigned();
        let future = match ctx
            .store("upcoming_reservations", self.shared.store.reservations(&upcoming))
            .await
        {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(restaurant_id, error = %e, "Future reservations unavailable, using fallback assignment");
                None
            }
        };

        let request = AssignmentRequest {
            party_size: query.party_size,
            date: query.date,
            time: query.time,
        };
        Ok(assignment::select_table(
            &report.tables(),
            &request,
            future.as_deref(),
            &self.shared.config.scheduling,
        ))
    }

    /// The table the optimizer would give the party, if any.
    pub async fn find_optimal_table(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        party_size: i32,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
    ) -> EngineResult<Option<Table>> {
        let query = AvailabilityQuery::new(date, time, duration_minutes, party_size);
        Ok(self
            .recommend_table(ctx, restaurant_id, &query)
            .await?
            .map(|a| a.table))
    }

    pub async fn get_reservation(&self, ctx: &RequestContext, reservation_id: &str) -> EngineResult<Reservation> {
        self.load(ctx, reservation_id).await
    }

    pub async fn list_reservations(
        &self,
        ctx: &RequestContext,
        filter: &ReservationFilter,
    ) -> EngineResult<Vec<Reservation>> {
        ctx.store("reservations", self.shared.store.reservations(filter)).await
    }

    // ---- Writes ----

    /// Validates, assigns a table when none was given, and books atomically.
    pub async fn create_reservation(
        &self,
        ctx: &RequestContext,
        req: NewReservation,
    ) -> EngineResult<Reservation> {
        debug!(
            restaurant_id = %req.restaurant_id,
            date = %req.date,
            time = %req.time,
            party_size = req.party_size,
            "create_reservation"
        );

        validation::validate_customer_name(&req.customer.name).map_err(CoreError::from)?;
        validation::validate_email(req.customer.email.as_deref()).map_err(CoreError::from)?;
        validation::validate_notes("special_requests", req.special_requests.as_deref())
            .map_err(CoreError::from)?;
        validation::validate_party_size(req.party_size).map_err(CoreError::from)?;

        let profile = ctx
            .store("restaurant_profile", self.shared.store.restaurant_profile(&req.restaurant_id))
            .await?;
        let duration = req.duration_minutes.unwrap_or_else(|| {
            profile
                .as_ref()
                .map(|p| p.settings.default_reservation_duration)
                .unwrap_or(self.shared.config.scheduling.default_slot_duration_minutes)
        });
        validation::validate_duration(duration).map_err(CoreError::from)?;

        let candidate = ReservationCandidate {
            restaurant_id: req.restaurant_id.clone(),
            date: req.date,
            time: req.time,
            party_size: req.party_size,
            duration_minutes: duration,
            table_id: req.table_id.clone(),
        };
        let report = self.rules_report(ctx, &candidate, profile.as_ref()).await?;
        if !report.valid {
            debug!(restaurant_id = %req.restaurant_id, errors = ?report.errors, "Reservation rejected by rules");
            return Err(EngineError::ValidationFailed {
                errors: report.errors,
                violations: report.violations,
            });
        }

        let table_id = match req.table_id {
            Some(id) => id,
            None => {
                let query = AvailabilityQuery::new(req.date, req.time, duration, req.party_size);
                self.recommend_table(ctx, &req.restaurant_id, &query)
                    .await?
                    .map(|a| a.table.id)
                    .ok_or(CoreError::NoTableAvailable {
                        party_size: req.party_size,
                    })?
            }
        };

        let now = self.shared.now();
        let status = if req.pending {
            ReservationStatus::Pending
        } else {
            ReservationStatus::Confirmed
        };
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            restaurant_id: req.restaurant_id,
            table_id: Some(table_id),
            waitlist_entry_id: req.waitlist_entry_id,
            customer_name: req.customer.name.trim().to_string(),
            customer_phone: req.customer.phone,
            customer_email: req.customer.email,
            party_size: req.party_size,
            date: req.date,
            time: req.time,
            duration_minutes: duration,
            status,
            special_requests: req.special_requests,
            created_at: now,
            updated_at: now,
            confirmed_at: (status == ReservationStatus::Confirmed).then_some(now),
            arrived_at: None,
            seated_at: None,
            completed_at: None,
            cancelled_at: None,
        };

        self.book(ctx, &reservation).await?;

        info!(
            reservation_id = %reservation.id,
            restaurant_id = %reservation.restaurant_id,
            table_id = ?reservation.table_id,
            date = %reservation.date,
            time = %reservation.time,
            "Reservation created"
        );
        self.shared
            .events
            .publish(DomainEvent::ReservationCreated(reservation.clone()));

        Ok(reservation)
    }

    /// Moves a reservation to a new date, time, size or table.
    ///
    /// The table is, in order: the requested one, the current one, or a
    /// fresh recommendation. The reservation never conflicts with itself.
    pub async fn reschedule_reservation(
        &self,
        ctx: &RequestContext,
        reservation_id: &str,
        change: Reschedule,
    ) -> EngineResult<Reservation> {
        debug!(reservation_id, ?change, "reschedule_reservation");

        let existing = self.load(ctx, reservation_id).await?;
        if existing.status.is_terminal() {
            return Err(CoreError::InvalidReservationTransition {
                id: existing.id,
                from: existing.status.to_string(),
                to: "rescheduled".to_string(),
            }
            .into());
        }

        let party_size = change.party_size.unwrap_or(existing.party_size);
        let duration = change.duration_minutes.unwrap_or(existing.duration_minutes);
        validation::validate_party_size(party_size).map_err(CoreError::from)?;
        validation::validate_duration(duration).map_err(CoreError::from)?;

        let mut updated = existing.clone();
        updated.date = change.date.unwrap_or(existing.date);
        updated.time = change.time.unwrap_or(existing.time);
        updated.duration_minutes = duration;
        updated.party_size = party_size;
        updated.table_id = change.table_id.or(existing.table_id);

        let candidate = ReservationCandidate {
            restaurant_id: updated.restaurant_id.clone(),
            date: updated.date,
            time: updated.time,
            party_size,
            duration_minutes: duration,
            table_id: updated.table_id.clone(),
        };
        let report = self.validate_reservation(ctx, &candidate).await?;
        if !report.valid {
            return Err(EngineError::ValidationFailed {
                errors: report.errors,
                violations: report.violations,
            });
        }

        if updated.table_id.is_none() {
            let query = AvailabilityQuery::new(updated.date, updated.time, duration, party_size)
                .excluding(updated.id.clone());
            let table = self
                .recommend_table(ctx, &updated.restaurant_id, &query)
                .await?
                .ok_or(CoreError::NoTableAvailable { party_size })?;
            updated.table_id = Some(table.table.id);
        }

        updated.updated_at = self.shared.now();
        let buffer = self.shared.config.scheduling.turnover_buffer_minutes;
        let outcome = ctx
            .store(
                "update_reservation_checked",
                self.shared.store.update_reservation_checked(&updated, buffer),
            )
            .await?;
        conflict_to_error(&updated, outcome)?;

        info!(
            reservation_id = %updated.id,
            table_id = ?updated.table_id,
            date = %updated.date,
            time = %updated.time,
            "Reservation rescheduled"
        );
        self.shared
            .events
            .publish(DomainEvent::ReservationUpdated(updated.clone()));

        Ok(updated)
    }

    /// Moves a reservation along its lifecycle, stamping the matching time.
    ///
    /// PENDING → CONFIRMED claims the table, so it re-runs the conflict check.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        reservation_id: &str,
        next: ReservationStatus,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.load(ctx, reservation_id).await?;
        let from = reservation.status;
        if !from.can_transition_to(next) {
            return Err(CoreError::InvalidReservationTransition {
                id: reservation.id,
                from: from.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        reservation.apply_status(next, self.shared.now());

        if from == ReservationStatus::Pending && next == ReservationStatus::Confirmed {
            let buffer = self.shared.config.scheduling.turnover_buffer_minutes;
            let outcome = ctx
                .store(
                    "update_reservation_checked",
                    self.shared.store.update_reservation_checked(&reservation, buffer),
                )
                .await?;
            conflict_to_error(&reservation, outcome)?;
        } else {
            ctx.store("update_reservation", self.shared.store.update_reservation(&reservation))
                .await?;
        }

        info!(reservation_id = %reservation.id, %from, to = %next, "Reservation status changed");
        self.shared.events.publish(DomainEvent::ReservationStatusChanged {
            reservation: reservation.clone(),
            from,
        });

        Ok(reservation)
    }

    /// Hard delete.
    pub async fn delete_reservation(&self, ctx: &RequestContext, reservation_id: &str) -> EngineResult<()> {
        let reservation = self.load(ctx, reservation_id).await?;
        let removed = ctx
            .store("delete_reservation", self.shared.store.delete_reservation(reservation_id))
            .await?;
        if !removed {
            return Err(CoreError::ReservationNotFound(reservation_id.to_string()).into());
        }

        info!(reservation_id, restaurant_id = %reservation.restaurant_id, "Reservation deleted");
        self.shared.events.publish(DomainEvent::ReservationDeleted {
            restaurant_id: reservation.restaurant_id,
            reservation_id: reservation.id,
            date: reservation.date,
        });

        Ok(())
    }

    // ---- Internals ----

    /// Checked insert; a conflict becomes [`EngineError::Conflict`].
    pub(crate) async fn book(&self, ctx: &RequestContext, reservation: &Reservation) -> EngineResult<()> {
        let buffer = self.shared.config.scheduling.turnover_buffer_minutes;
        let outcome = ctx
            .store(
                "insert_reservation_checked",
                self.shared.store.insert_reservation_checked(reservation, buffer),
            )
            .await?;
        conflict_to_error(reservation, outcome)
    }

    async fn load(&self, ctx: &RequestContext, reservation_id: &str) -> EngineResult<Reservation> {
        ctx.store("reservation", self.shared.store.reservation(reservation_id))
            .await?
            .ok_or_else(|| CoreError::ReservationNotFound(reservation_id.to_string()).into())
    }

    async fn rules_report(
        &self,
        ctx: &RequestContext,
        candidate: &ReservationCandidate,
        profile: Option<&RestaurantProfile>,
    ) -> EngineResult<ValidationReport> {
        let store = &self.shared.store;

        let blackout_dates = match profile {
            Some(_) => {
                ctx.store("blackout_dates", store.blackout_dates(&candidate.restaurant_id))
                    .await?
            }
            None => Vec::new(),
        };
        let table = match candidate.table_id.as_deref() {
            Some(table_id) => ctx.store("table", store.table(table_id)).await?,
            None => None,
        };
        let now_local = match profile {
            Some(p) => self.shared.local_now(p),
            None => self.shared.now().naive_utc(),
        };

        Ok(rules::validate(
            candidate,
            &RuleContext {
                profile,
                blackout_dates: &blackout_dates,
                table: table.as_ref(),
                now_local,
            },
        ))
    }
}

fn conflict_to_error(reservation: &Reservation, outcome: BookingOutcome) -> EngineResult<()> {
    match outcome {
        BookingOutcome::Booked => Ok(()),
        BookingOutcome::Conflicted(conflicts) => {
            let table_id = reservation.table_id.clone().unwrap_or_default();
            warn!(
                reservation_id = %reservation.id,
                table_id = %table_id,
                conflicts = conflicts.len(),
                "Booking conflict"
            );
            Err(EngineError::Conflict { table_id, conflicts })
        }
    }
}
