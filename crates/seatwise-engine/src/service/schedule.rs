//! # Schedule Service
//!
//! Time slots for the booking calendar and the day/week rollups built on
//! them.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use seatwise_core::filter::{ReservationFilter, TableFilter};
use seatwise_core::reports::{self, DaySummary, PeakHour, WeekSummary};
use seatwise_core::slots::{self, SlotRequest, TimeSlot, TimeSlots};
use seatwise_core::validation;
use seatwise_core::{CoreError, OperatingHours, Reservation, SchedulingPolicy, Table};

use super::Shared;
use crate::context::RequestContext;
use crate::error::EngineResult;
use crate::store::BookingStore;

/// Everything needed to walk one day's slots without further store calls.
///
/// Slots are computed lazily by [`SlotPlan::iter`].
#[derive(Debug, Clone)]
pub struct SlotPlan {
    hours: Option<OperatingHours>,
    tables: Vec<Table>,
    reservations: Vec<Reservation>,
    request: SlotRequest,
    policy: SchedulingPolicy,
}

impl SlotPlan {
    pub fn iter(&self) -> TimeSlots<'_> {
        TimeSlots::new(
            self.hours.as_ref(),
            &self.tables,
            &self.reservations,
            self.request,
            &self.policy,
        )
    }

    pub fn request(&self) -> &SlotRequest {
        &self.request
    }

    pub fn is_open(&self) -> bool {
        self.hours.as_ref().is_some_and(|h| h.is_open)
    }

    /// Seats one slot could offer the party on an empty floor.
    pub fn eligible_capacity(&self) -> i32 {
        slots::eligible_capacity(&self.tables, self.request.party_size)
    }

    /// Every reservation of the day, cancelled ones included.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }
}

impl<'a> IntoIterator for &'a SlotPlan {
    type Item = TimeSlot;
    type IntoIter = TimeSlots<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Calendar and reporting operations over a [`BookingStore`].
pub struct ScheduleService<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for ScheduleService<S> {
    fn clone(&self) -> Self {
        ScheduleService {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: BookingStore> ScheduleService<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>) -> Self {
        ScheduleService { shared }
    }

    /// Slots of `date` for a party, using the configured granularity.
    ///
    /// `duration_minutes` defaults to the configured slot duration.
    pub async fn time_slots(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: i32,
        duration_minutes: Option<i32>,
    ) -> EngineResult<SlotPlan> {
        let request = self.request(date, party_size, duration_minutes);
        self.time_slots_with(ctx, restaurant_id, request).await
    }

    /// Slots for a fully specified request.
    pub async fn time_slots_with(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        request: SlotRequest,
    ) -> EngineResult<SlotPlan> {
        check_request(&request)?;
        let profile = self.shared.profile(ctx, restaurant_id).await?;
        let tables = self.active_tables(ctx, restaurant_id).await?;
        let reservations = ctx
            .store(
                "reservations",
                self.shared
                    .store
                    .reservations(&ReservationFilter::for_restaurant(restaurant_id).on(request.date)),
            )
            .await?;

        Ok(SlotPlan {
            hours: profile.hours_for(request.date).cloned(),
            tables,
            reservations,
            request,
            policy: self.shared.config.scheduling.clone(),
        })
    }

    pub async fn day_summary(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: i32,
        duration_minutes: Option<i32>,
    ) -> EngineResult<DaySummary> {
        let plan = self.time_slots(ctx, restaurant_id, date, party_size, duration_minutes).await?;
        let slots: Vec<TimeSlot> = plan.iter().collect();

        Ok(reports::summarize_day(
            date,
            plan.is_open(),
            &slots,
            plan.eligible_capacity(),
            plan.reservations(),
        ))
    }

    /// Seven day summaries starting at `start_date`, from one read of each
    /// kind.
    pub async fn week_summary(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        start_date: NaiveDate,
        party_size: i32,
        duration_minutes: Option<i32>,
    ) -> EngineResult<WeekSummary> {
        let base = self.request(start_date, party_size, duration_minutes);
        check_request(&base)?;

        let profile = self.shared.profile(ctx, restaurant_id).await?;
        let tables = self.active_tables(ctx, restaurant_id).await?;
        let end_date = start_date + Duration::days(6);
        let reservations = ctx
            .store(
                "reservations",
                self.shared
                    .store
                    .reservations(&ReservationFilter::for_restaurant(restaurant_id).between(start_date, end_date)),
            )
            .await?;

        let policy = &self.shared.config.scheduling;
        let eligible = slots::eligible_capacity(&tables, party_size);
        let days = start_date
            .iter_days()
            .take(7)
            .map(|date| {
                let hours = profile.hours_for(date);
                let request = SlotRequest { date, ..base };
                let slots: Vec<TimeSlot> = TimeSlots::new(hours, &tables, &reservations, request, policy).collect();
                reports::summarize_day(date, hours.is_some_and(|h| h.is_open), &slots, eligible, &reservations)
            })
            .collect();

        let week = reports::summarize_week(start_date, days);
        debug!(
            restaurant_id,
            start = %start_date,
            reservations = week.total_reservations,
            busiest = ?week.busiest_day,
            "Built week summary"
        );
        Ok(week)
    }

    /// Hours of `date` ranked by utilization, busiest first.
    pub async fn peak_hours(
        &self,
        ctx: &RequestContext,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: i32,
        duration_minutes: Option<i32>,
    ) -> EngineResult<Vec<PeakHour>> {
        let plan = self.time_slots(ctx, restaurant_id, date, party_size, duration_minutes).await?;
        let slots: Vec<TimeSlot> = plan.iter().collect();
        Ok(reports::rank_peak_hours(&slots, plan.eligible_capacity()))
    }

    fn request(&self, date: NaiveDate, party_size: i32, duration_minutes: Option<i32>) -> SlotRequest {
        let mut request = SlotRequest::with_defaults(date, party_size, &self.shared.config.scheduling);
        if let Some(minutes) = duration_minutes {
            request.duration_minutes = minutes;
        }
        request
    }

    async fn active_tables(&self, ctx: &RequestContext, restaurant_id: &str) -> EngineResult<Vec<Table>> {
        ctx.store("tables", self.shared.store.tables(&TableFilter::active(restaurant_id)))
            .await
    }
}

fn check_request(request: &SlotRequest) -> EngineResult<()> {
    validation::validate_party_size(request.party_size).map_err(CoreError::from)?;
    validation::validate_duration(request.duration_minutes).map_err(CoreError::from)?;
    if request.granularity_minutes <= 0 {
        return Err(CoreError::from(seatwise_core::ValidationError::MustBePositive {
            field: "granularity_minutes".to_string(),
        })
        .into());
    }
    Ok(())
}
