//! # Table-Assignment Optimizer
//!
//! Picks one table out of the free candidates for a party.
//!
//! ## Selection Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  candidates (free, active, capacity >= party)                          │
//! │       │                                                                 │
//! │       ├── future bookings unreadable? ──► FALLBACK: first by capacity  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  smallest capacity group                                               │
//! │       ├── one table, capacity == party ──► PERFECT FIT                 │
//! │       ├── one table                    ──► SMALLEST SUFFICIENT         │
//! │       └── several tables               ──► LEAST FUTURE IMPACT         │
//! │                                                                         │
//! │  future impact(table) =                                                │
//! │      Σ max(0, capacity - future.party - slack)   over later unassigned │
//! │                                                   bookings that day    │
//! │    + waste_weight × (capacity - party)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The optimizer only recommends; it never writes.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::policy::SchedulingPolicy;
use crate::types::{Reservation, ReservationStatus, Table};

/// Which rung of the ladder produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    PerfectFit,
    SmallestSufficient,
    LeastFutureImpact,
    Fallback,
}

/// The recommended table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Assignment {
    pub table: Table,
    pub strategy: AssignmentStrategy,
    /// Future-impact score, when one was computed.
    pub score: Option<f64>,
}

/// What the party needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentRequest {
    pub party_size: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Chooses a table for `request`.
///
/// ## Arguments
/// * `candidates` - Tables that are free for the requested window
/// * `future` - Same-restaurant reservations; `None` when they could not be
///   read, which drops straight to the fallback rung
///
/// Returns `None` when no candidate seats the party.
pub fn select_table(
    candidates: &[Table],
    request: &AssignmentRequest,
    future: Option<&[Reservation]>,
    policy: &SchedulingPolicy,
) -> Option<Assignment> {
    let mut fitting: Vec<&Table> = candidates
        .iter()
        .filter(|t| t.is_active && t.seats(request.party_size))
        .collect();
    fitting.sort_by(|a, b| {
        a.capacity
            .cmp(&b.capacity)
            .then_with(|| a.table_number.cmp(&b.table_number))
    });

    let first = *fitting.first()?;

    let Some(future) = future else {
        return Some(Assignment {
            table: first.clone(),
            strategy: AssignmentStrategy::Fallback,
            score: None,
        });
    };

    let smallest: Vec<&Table> = fitting
        .iter()
        .copied()
        .take_while(|t| t.capacity == first.capacity)
        .collect();

    if smallest.len() == 1 {
        let strategy = if first.capacity == request.party_size {
            AssignmentStrategy::PerfectFit
        } else {
            AssignmentStrategy::SmallestSufficient
        };
        return Some(Assignment {
            table: first.clone(),
            strategy,
            score: None,
        });
    }

    let later = upcoming_unassigned(future, request);
    let mut best: Option<(&Table, f64)> = None;
    for table in smallest {
        let score = future_impact(table, request.party_size, &later, policy);
        // Strict comparison keeps the earlier (lower table number) on ties.
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((table, score));
        }
    }

    best.map(|(table, score)| Assignment {
        table: table.clone(),
        strategy: AssignmentStrategy::LeastFutureImpact,
        score: Some(score),
    })
}

/// Unassigned bookings later the same day that will still need a table.
pub fn upcoming_unassigned<'a>(
    reservations: &'a [Reservation],
    request: &AssignmentRequest,
) -> Vec<&'a Reservation> {
    reservations
        .iter()
        .filter(|r| r.date == request.date && r.time > request.time)
        .filter(|r| r.table_id.is_none())
        .filter(|r| ReservationStatus::UPCOMING.contains(&r.status))
        .collect()
}

/// Lower is better.
pub fn future_impact(
    table: &Table,
    party_size: i32,
    later: &[&Reservation],
    policy: &SchedulingPolicy,
) -> f64 {
    let blocked: i32 = later
        .iter()
        .map(|r| (table.capacity - r.party_size - policy.future_party_slack).max(0))
        .sum();

    blocked as f64 + policy.waste_weight * (table.capacity - party_size) as f64
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::tests::{booking, date, hm, table};

    fn request(party_size: i32) -> AssignmentRequest {
        AssignmentRequest {
            party_size,
            date: date(),
            time: hm(18, 0),
        }
    }

    #[test]
    fn test_perfect_fit_precedence() {
        let tables = vec![table("A", 2), table("B", 4), table("C", 4), table("D", 6)];
        let picked = select_table(&tables, &request(4), Some(&[][..]), &SchedulingPolicy::default()).unwrap();
        assert_eq!(picked.table.capacity, 4);
        assert_eq!(picked.table.id, "B");
        assert_eq!(picked.strategy, AssignmentStrategy::LeastFutureImpact);

        let single = vec![table("A", 2), table("B", 4), table("D", 6)];
        let picked = select_table(&single, &request(4), Some(&[][..]), &SchedulingPolicy::default()).unwrap();
        assert_eq!(picked.strategy, AssignmentStrategy::PerfectFit);
    }

    #[test]
    fn test_smallest_sufficient() {
        let tables = vec![table("D", 6), table("E", 8), table("A", 2)];
        let picked = select_table(&tables, &request(3), Some(&[][..]), &SchedulingPolicy::default()).unwrap();
        assert_eq!(picked.table.id, "D");
        assert_eq!(picked.strategy, AssignmentStrategy::SmallestSufficient);
    }

    #[test]
    fn test_capacity_respected() {
        let tables = vec![table("A", 2), table("B", 4), table("C", 10)];
        assert!(select_table(&tables, &request(12), Some(&[][..]), &SchedulingPolicy::default()).is_none());
        assert!(select_table(&[], &request(2), Some(&[][..]), &SchedulingPolicy::default()).is_none());
    }

    #[test]
    fn test_fallback_without_future_data() {
        let tables = vec![table("C", 6), table("B", 6)];
        let picked = select_table(&tables, &request(4), None, &SchedulingPolicy::default()).unwrap();
        assert_eq!(picked.table.id, "B");
        assert_eq!(picked.strategy, AssignmentStrategy::Fallback);
        assert!(picked.score.is_none());
    }

    #[test]
    fn test_future_impact_score() {
        let later = vec![
            booking("x", None, hm(20, 0), 90),
            booking("y", None, hm(21, 0), 90),
        ];
        let refs: Vec<&Reservation> = later.iter().collect();
        // 6-top for a party of 4 with two later 2-person parties:
        // (6-2-2) + (6-2-2) + 0.5 * 2
        let score = future_impact(&table("T", 6), 4, &refs, &SchedulingPolicy::default());
        assert!((score - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_upcoming_unassigned_filters() {
        let mut seated = booking("a", None, hm(20, 0), 60);
        seated.status = ReservationStatus::Seated;
        let reservations = vec![
            booking("before", None, hm(17, 0), 60),
            booking("assigned", Some("T1"), hm(20, 0), 60),
            seated,
            booking("later", None, hm(20, 30), 60),
        ];
        let later = upcoming_unassigned(&reservations, &request(2));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].id, "later");
    }
}
