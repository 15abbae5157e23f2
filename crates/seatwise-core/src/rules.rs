//! # Business-Rule Validator
//!
//! Checks a candidate reservation against the restaurant's configuration.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Restaurant exists and is active  ── if not, stop: only error       │
//! │  2. Date not in the past (restaurant-local)                            │
//! │  3. Date within max_advance_booking_days                               │
//! │  4. Open that weekday, window inside [open, close]                     │
//! │  5. Party size within [min, max]                                       │
//! │  6. Duration within [min, max]                                         │
//! │  7. Lead time >= min_advance_booking_minutes                           │
//! │  8. Table (if given) exists here, is active, is big enough             │
//! │  9. No blackout date covers the date                                   │
//! │                                                                         │
//! │  Every violated rule from 2-9 is reported; nothing short-circuits.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The validator has no side effects and reads no clock: the caller passes
//! the restaurant-local "now".

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::availability::TimeWindow;
use crate::types::{time_from_minutes, BlackoutDate, RestaurantProfile, Table};

// =============================================================================
// Input
// =============================================================================

/// A reservation as proposed by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReservationCandidate {
    pub restaurant_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub party_size: i32,
    pub duration_minutes: i32,
    pub table_id: Option<String>,
}

impl ReservationCandidate {
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.time, self.duration_minutes)
    }

    #[inline]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Records the validator needs, already loaded by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// `None` when the restaurant does not exist.
    pub profile: Option<&'a RestaurantProfile>,
    pub blackout_dates: &'a [BlackoutDate],
    /// The table named by the candidate, if it was found.
    pub table: Option<&'a Table>,
    /// Current restaurant-local wall-clock time.
    pub now_local: NaiveDateTime,
}

// =============================================================================
// Violations
// =============================================================================

/// One broken business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleViolation {
    #[error("Restaurant not found or inactive")]
    RestaurantUnavailable,

    #[error("Cannot make reservations for past dates")]
    DateInPast,

    #[error("Cannot book more than {max_days} days in advance")]
    BeyondBookingWindow { max_days: i32 },

    #[error("Restaurant is closed on this day")]
    ClosedOnDay,

    #[error("Reservation must be within operating hours ({open} - {close})")]
    OutsideOperatingHours { open: String, close: String },

    #[error("Party size must be between {min} and {max}")]
    PartySizeOutOfRange { min: i32, max: i32 },

    #[error("Reservation duration must be between {min} and {max} minutes")]
    DurationOutOfRange { min: i32, max: i32 },

    #[error("Reservations must be made at least {min_minutes} minutes in advance")]
    InsufficientLeadTime { min_minutes: i32 },

    #[error("Table not found")]
    TableNotFound,

    #[error("Table is not active")]
    TableInactive,

    #[error("Table capacity ({capacity}) is less than party size ({party_size})")]
    TableTooSmall { capacity: i32, party_size: i32 },

    #[error("Restaurant is closed on this date{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Blackout { reason: Option<String> },
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationReport {
    pub valid: bool,
    /// Human-readable messages, in rule order.
    pub errors: Vec<String>,
    pub violations: Vec<RuleViolation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<RuleViolation>) -> Self {
        ValidationReport {
            valid: violations.is_empty(),
            errors: violations.iter().map(ToString::to_string).collect(),
            violations,
        }
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Runs every business rule against `candidate`.
pub fn validate(candidate: &ReservationCandidate, ctx: &RuleContext<'_>) -> ValidationReport {
    let profile = match ctx.profile {
        Some(p) if p.restaurant.is_active && p.restaurant.id == candidate.restaurant_id => p,
        _ => return ValidationReport::from_violations(vec![RuleViolation::RestaurantUnavailable]),
    };
    let settings = &profile.settings;
    let today = ctx.now_local.date();
    let mut violations = Vec::new();

    if candidate.date < today {
        violations.push(RuleViolation::DateInPast);
    }

    if (candidate.date - today).num_days() > settings.max_advance_booking_days as i64 {
        violations.push(RuleViolation::BeyondBookingWindow {
            max_days: settings.max_advance_booking_days,
        });
    }

    match profile.hours_for(candidate.date) {
        Some(hours) if hours.is_open => {
            if !hours.contains(&candidate.window()) {
                violations.push(RuleViolation::OutsideOperatingHours {
                    open: clock_label(hours.open_time),
                    close: clock_label(hours.close_time),
                });
            }
        }
        _ => violations.push(RuleViolation::ClosedOnDay),
    }

    if candidate.party_size < settings.min_party_size
        || candidate.party_size > settings.max_party_size
    {
        violations.push(RuleViolation::PartySizeOutOfRange {
            min: settings.min_party_size,
            max: settings.max_party_size,
        });
    }

    if candidate.duration_minutes < settings.min_reservation_duration
        || candidate.duration_minutes > settings.max_reservation_duration
    {
        violations.push(RuleViolation::DurationOutOfRange {
            min: settings.min_reservation_duration,
            max: settings.max_reservation_duration,
        });
    }

    let lead_minutes = (candidate.starts_at() - ctx.now_local).num_minutes();
    if lead_minutes < settings.min_advance_booking_minutes as i64 {
        violations.push(RuleViolation::InsufficientLeadTime {
            min_minutes: settings.min_advance_booking_minutes,
        });
    }

    if candidate.table_id.is_some() {
        match ctx.table {
            Some(t)
                if Some(t.id.as_str()) == candidate.table_id.as_deref()
                    && t.restaurant_id == candidate.restaurant_id =>
            {
                if !t.is_active {
                    violations.push(RuleViolation::TableInactive);
                }
                if t.capacity < candidate.party_size {
                    violations.push(RuleViolation::TableTooSmall {
                        capacity: t.capacity,
                        party_size: candidate.party_size,
                    });
                }
            }
            _ => violations.push(RuleViolation::TableNotFound),
        }
    }

    if let Some(blackout) = ctx
        .blackout_dates
        .iter()
        .find(|b| b.restaurant_id == candidate.restaurant_id && b.covers(candidate.date))
    {
        violations.push(RuleViolation::Blackout {
            reason: blackout.reason.clone(),
        });
    }

    ValidationReport::from_violations(violations)
}

/// "HH:MM" for a minute offset; closing times past midnight wrap.
fn clock_label(minutes: i32) -> String {
    time_from_minutes(minutes).format("%H:%M").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{OperatingHours, Restaurant, RestaurantSettings, TableShape};
    use chrono::Utc;

    pub(crate) fn profile() -> RestaurantProfile {
        let now = Utc::now();
        RestaurantProfile {
            restaurant: Restaurant {
                id: "r1".into(),
                name: "Osteria".into(),
                timezone: "UTC".into(),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            settings: RestaurantSettings::defaults_for("r1"),
            operating_hours: (0..7)
                .map(|dow| OperatingHours {
                    restaurant_id: "r1".into(),
                    day_of_week: dow,
                    open_time: 17 * 60,
                    close_time: 22 * 60,
                    // Closed Mondays
                    is_open: dow != 1,
                })
                .collect(),
        }
    }

    fn table(capacity: i32, active: bool) -> Table {
        Table {
            id: "t1".into(),
            restaurant_id: "r1".into(),
            table_number: "1".into(),
            capacity,
            section: None,
            shape: TableShape::Round,
            pos_x: 0.0,
            pos_y: 0.0,
            width: 1.0,
            height: 1.0,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Sunday 2026-10-18 at noon
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn candidate(date: NaiveDate, h: u32, m: u32) -> ReservationCandidate {
        ReservationCandidate {
            restaurant_id: "r1".into(),
            date,
            time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            party_size: 2,
            duration_minutes: 120,
            table_id: None,
        }
    }

    fn ctx<'a>(profile: Option<&'a RestaurantProfile>, blackouts: &'a [BlackoutDate]) -> RuleContext<'a> {
        RuleContext {
            profile,
            blackout_dates: blackouts,
            table: None,
            now_local: now(),
        }
    }

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()
    }

    #[test]
    fn test_valid_dinner() {
        let p = profile();
        let report = validate(&candidate(friday(), 19, 0), &ctx(Some(&p), &[]));
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_restaurant_is_the_only_error() {
        let mut c = candidate(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 3, 0);
        c.party_size = 0;
        let report = validate(&c, &ctx(None, &[]));
        assert_eq!(report.violations, vec![RuleViolation::RestaurantUnavailable]);

        let mut inactive = profile();
        inactive.restaurant.is_active = false;
        let report = validate(&c, &ctx(Some(&inactive), &[]));
        assert_eq!(report.violations, vec![RuleViolation::RestaurantUnavailable]);
    }

    #[test]
    fn test_collects_every_violation() {
        let p = profile();
        let mut c = candidate(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), 21, 0);
        c.party_size = 25;
        c.duration_minutes = 600;

        let report = validate(&c, &ctx(Some(&p), &[]));
        assert!(!report.valid);
        assert_eq!(
            report.violations,
            vec![
                RuleViolation::DateInPast,
                RuleViolation::OutsideOperatingHours {
                    open: "17:00".into(),
                    close: "22:00".into()
                },
                RuleViolation::PartySizeOutOfRange { min: 1, max: 20 },
                RuleViolation::DurationOutOfRange { min: 30, max: 480 },
                RuleViolation::InsufficientLeadTime { min_minutes: 30 },
            ]
        );
        assert_eq!(report.errors.len(), 5);
        assert_eq!(report.errors[0], "Cannot make reservations for past dates");
    }

    #[test]
    fn test_closed_weekday() {
        let p = profile();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let report = validate(&candidate(monday, 19, 0), &ctx(Some(&p), &[]));
        assert_eq!(report.violations, vec![RuleViolation::ClosedOnDay]);
    }

    #[test]
    fn test_window_ending_at_close_is_allowed() {
        let p = profile();
        let report = validate(&candidate(friday(), 20, 0), &ctx(Some(&p), &[]));
        assert!(report.valid);
        let report = validate(&candidate(friday(), 20, 1), &ctx(Some(&p), &[]));
        assert!(!report.valid);
    }

    #[test]
    fn test_booking_window_and_lead_time() {
        let p = profile();
        let far = now().date() + chrono::Duration::days(61);
        let report = validate(&candidate(far, 19, 0), &ctx(Some(&p), &[]));
        assert!(report
            .violations
            .contains(&RuleViolation::BeyondBookingWindow { max_days: 60 }));

        // Today at 12:20 is only 20 minutes away (and before opening).
        let soon = validate(&candidate(now().date(), 12, 20), &ctx(Some(&p), &[]));
        assert!(soon
            .violations
            .contains(&RuleViolation::InsufficientLeadTime { min_minutes: 30 }));
    }

    #[test]
    fn test_table_rules() {
        let p = profile();
        let mut c = candidate(friday(), 19, 0);
        c.table_id = Some("t1".into());
        c.party_size = 4;

        let missing = validate(&c, &ctx(Some(&p), &[]));
        assert_eq!(missing.violations, vec![RuleViolation::TableNotFound]);

        let small = table(2, false);
        let report = validate(
            &c,
            &RuleContext {
                table: Some(&small),
                ..ctx(Some(&p), &[])
            },
        );
        assert_eq!(
            report.violations,
            vec![
                RuleViolation::TableInactive,
                RuleViolation::TableTooSmall {
                    capacity: 2,
                    party_size: 4
                },
            ]
        );

        let mut foreign = table(4, true);
        foreign.restaurant_id = "r2".into();
        let report = validate(
            &c,
            &RuleContext {
                table: Some(&foreign),
                ..ctx(Some(&p), &[])
            },
        );
        assert_eq!(report.violations, vec![RuleViolation::TableNotFound]);
    }

    #[test]
    fn test_blackout_date() {
        let p = profile();
        let blackouts = vec![BlackoutDate {
            id: "b1".into(),
            restaurant_id: "r1".into(),
            start_date: friday(),
            end_date: None,
            reason: Some("Private event".into()),
        }];
        let report = validate(&candidate(friday(), 19, 0), &ctx(Some(&p), &blackouts));
        assert_eq!(
            report.errors,
            vec!["Restaurant is closed on this date: Private event".to_string()]
        );
    }
}
