//! # Waitlist Module
//!
//! Wait-time estimation and queue ordering.
//!
//! ## Queue Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WAITING entries of one restaurant                                     │
//! │                                                                         │
//! │    sort by priority DESC, created_at ASC (id ASC as last resort)       │
//! │    position = index + 1                                                 │
//! │                                                                         │
//! │    prio 9  12:05  ──► 1                                                 │
//! │    prio 5  12:00  ──► 2                                                 │
//! │    prio 5  12:10  ──► 3                                                 │
//! │    prio 3  11:50  ──► 4                                                 │
//! │                                                                         │
//! │  NOTIFIED entries keep whatever position they had; terminal entries    │
//! │  have none.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wait Estimate
//! ```text
//! estimate = ceil((similar + 1) × avg_turnover / max(tables, 1))   capped
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::policy::WaitlistPolicy;
use crate::types::{Reservation, Table, WaitlistEntry, WaitlistStatus};

// =============================================================================
// Turnover
// =============================================================================

/// Where an average turnover figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TurnoverSource {
    /// Mean of `completed_at - seated_at`.
    SeatedToCompleted,
    /// Mean of the booked durations.
    BookedDuration,
    /// No history at all.
    Default,
}

/// Average table turnover in minutes over completed reservations.
///
/// The caller passes the completed reservations of the lookback window.
pub fn average_turnover(completed: &[Reservation], policy: &WaitlistPolicy) -> (f64, TurnoverSource) {
    let measured: Vec<f64> = completed
        .iter()
        .filter_map(|r| match (r.seated_at, r.completed_at) {
            (Some(seated), Some(done)) if done > seated => {
                Some((done - seated).num_seconds() as f64 / 60.0)
            }
            _ => None,
        })
        .collect();

    if !measured.is_empty() {
        let mean = measured.iter().sum::<f64>() / measured.len() as f64;
        return (mean, TurnoverSource::SeatedToCompleted);
    }

    let booked: Vec<f64> = completed
        .iter()
        .filter(|r| r.duration_minutes > 0)
        .map(|r| r.duration_minutes as f64)
        .collect();

    if !booked.is_empty() {
        let mean = booked.iter().sum::<f64>() / booked.len() as f64;
        return (mean, TurnoverSource::BookedDuration);
    }

    (policy.default_turnover_minutes as f64, TurnoverSource::Default)
}

// =============================================================================
// Estimate
// =============================================================================

/// Inputs and result of one wait estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WaitEstimate {
    /// `None` when the inputs could not produce a number.
    pub minutes: Option<i32>,
    pub similar_parties: usize,
    pub average_turnover_minutes: f64,
    pub turnover_source: TurnoverSource,
    pub suitable_tables: usize,
}

/// WAITING entries whose party size is within the tolerance of `party_size`.
pub fn count_similar(
    entries: &[WaitlistEntry],
    party_size: i32,
    policy: &WaitlistPolicy,
    exclude_id: Option<&str>,
) -> usize {
    entries
        .iter()
        .filter(|e| e.status == WaitlistStatus::Waiting)
        .filter(|e| exclude_id.map_or(true, |id| e.id != id))
        .filter(|e| (e.party_size - party_size).abs() <= policy.similar_party_tolerance)
        .count()
}

/// Active tables that could seat `party_size`.
pub fn count_suitable_tables(tables: &[Table], party_size: i32) -> usize {
    tables
        .iter()
        .filter(|t| t.is_active && t.seats(party_size))
        .count()
}

/// Minutes until a party is likely seated, never above the cap.
///
/// Returns `None` for a non-finite or non-positive turnover.
pub fn estimate_wait(
    similar_parties: usize,
    average_turnover_minutes: f64,
    suitable_tables: usize,
    policy: &WaitlistPolicy,
) -> Option<i32> {
    if !average_turnover_minutes.is_finite() || average_turnover_minutes <= 0.0 {
        return None;
    }

    let ahead = (similar_parties + 1) as f64;
    let tables = suitable_tables.max(1) as f64;
    let raw = (ahead * average_turnover_minutes / tables).ceil();

    let capped = raw.min(policy.max_wait_minutes as f64).max(0.0);
    Some(capped as i32)
}

/// Full estimate for a party given the restaurant's current state.
pub fn estimate_for_party(
    party_size: i32,
    entries: &[WaitlistEntry],
    tables: &[Table],
    completed: &[Reservation],
    policy: &WaitlistPolicy,
    exclude_id: Option<&str>,
) -> WaitEstimate {
    let similar_parties = count_similar(entries, party_size, policy, exclude_id);
    let (average_turnover_minutes, turnover_source) = average_turnover(completed, policy);
    let suitable_tables = count_suitable_tables(tables, party_size);

    WaitEstimate {
        minutes: estimate_wait(similar_parties, average_turnover_minutes, suitable_tables, policy),
        similar_parties,
        average_turnover_minutes,
        turnover_source,
        suitable_tables,
    }
}

// =============================================================================
// Positions
// =============================================================================

/// One row of a batch position write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PositionUpdate {
    pub entry_id: String,
    pub position: i32,
}

/// Position a newcomer gets before the queue is reordered.
pub fn next_position(entries: &[WaitlistEntry]) -> i32 {
    let waiting = entries
        .iter()
        .filter(|e| e.status == WaitlistStatus::Waiting)
        .count();
    waiting as i32 + 1
}

/// Dense 1..N positions for the WAITING entries.
///
/// Entries in any other status are ignored.
pub fn assign_positions(entries: &[WaitlistEntry]) -> Vec<PositionUpdate> {
    let mut waiting: Vec<&WaitlistEntry> = entries
        .iter()
        .filter(|e| e.status == WaitlistStatus::Waiting)
        .collect();

    waiting.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    waiting
        .into_iter()
        .enumerate()
        .map(|(i, e)| PositionUpdate {
            entry_id: e.id.clone(),
            position: i as i32 + 1,
        })
        .collect()
}

/// Applies `updates` to entries held in memory.
pub fn apply_positions(entries: &mut [WaitlistEntry], updates: &[PositionUpdate]) {
    for update in updates {
        if let Some(entry) = entries.iter_mut().find(|e| e.id == update.entry_id) {
            entry.position = Some(update.position);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::availability::tests::{booking, hm, table};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 18, 0, 0).unwrap()
    }

    pub(crate) fn entry(id: &str, party_size: i32, priority: i32, minute: i64) -> WaitlistEntry {
        let created = base() + Duration::minutes(minute);
        WaitlistEntry {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            table_id: None,
            reservation_id: None,
            customer_name: format!("Guest {id}"),
            customer_phone: None,
            customer_email: None,
            party_size,
            priority,
            position: None,
            estimated_wait_minutes: None,
            status: WaitlistStatus::Waiting,
            notification_count: 0,
            last_notified_at: None,
            seated_at: None,
            cancelled_at: None,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_priority_then_arrival() {
        let entries = vec![
            entry("low-early", 2, 3, 0),
            entry("mid-late", 2, 5, 20),
            entry("mid-early", 2, 5, 10),
            entry("high", 2, 9, 30),
        ];
        let updates = assign_positions(&entries);
        let order: Vec<&str> = updates.iter().map(|u| u.entry_id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid-early", "mid-late", "low-early"]);
        assert_eq!(updates.iter().map(|u| u.position).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_non_waiting_entries_keep_out() {
        let mut notified = entry("n", 2, 10, 0);
        notified.status = WaitlistStatus::Notified;
        notified.position = Some(1);
        let entries = vec![notified, entry("a", 2, 1, 5)];

        let updates = assign_positions(&entries);
        assert_eq!(updates, vec![PositionUpdate { entry_id: "a".into(), position: 1 }]);
        assert_eq!(next_position(&entries), 2);
    }

    #[test]
    fn test_turnover_sources() {
        let policy = WaitlistPolicy::default();
        assert_eq!(average_turnover(&[], &policy), (120.0, TurnoverSource::Default));

        let mut a = booking("a", Some("T1"), hm(18, 0), 90);
        let mut b = booking("b", Some("T1"), hm(20, 0), 60);
        assert_eq!(
            average_turnover(&[a.clone(), b.clone()], &policy),
            (75.0, TurnoverSource::BookedDuration)
        );

        a.seated_at = Some(base());
        a.completed_at = Some(base() + Duration::minutes(100));
        b.seated_at = Some(base());
        b.completed_at = Some(base() + Duration::minutes(80));
        assert_eq!(average_turnover(&[a, b], &policy), (90.0, TurnoverSource::SeatedToCompleted));
    }

    #[test]
    fn test_estimate_rounds_up_and_caps() {
        let policy = WaitlistPolicy::default();
        // (1 + 1) * 50 / 3 = 33.3 -> 34
        assert_eq!(estimate_wait(1, 50.0, 3, &policy), Some(34));
        // No suitable table divides by one
        assert_eq!(estimate_wait(0, 120.0, 0, &policy), Some(120));
        assert_eq!(estimate_wait(10, 120.0, 1, &policy), Some(240));
        assert_eq!(estimate_wait(0, f64::NAN, 1, &policy), None);
        assert_eq!(estimate_wait(0, 0.0, 1, &policy), None);
    }

    #[test]
    fn test_oversized_party_still_gets_estimate() {
        let policy = WaitlistPolicy::default();
        let tables = vec![table("T1", 2), table("T2", 10)];
        let estimate = estimate_for_party(12, &[], &tables, &[], &policy, None);
        assert_eq!(estimate.suitable_tables, 0);
        assert_eq!(estimate.minutes, Some(120));
        assert!(estimate.minutes.unwrap() > 0);
    }

    #[test]
    fn test_count_similar_uses_tolerance() {
        let policy = WaitlistPolicy::default();
        let mut seated = entry("s", 4, 5, 0);
        seated.status = WaitlistStatus::Seated;
        let entries = vec![entry("a", 2, 5, 0), entry("b", 6, 5, 1), entry("c", 7, 5, 2), seated];
        assert_eq!(count_similar(&entries, 4, &policy, None), 2);
        assert_eq!(count_similar(&entries, 4, &policy, Some("a")), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue { priority: i32 },
        Reprioritize { index: usize, priority: i32 },
        Leave { index: usize, status: WaitlistStatus },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i32..=10).prop_map(|priority| Op::Enqueue { priority }),
            (any::<usize>(), 1i32..=10).prop_map(|(index, priority)| Op::Reprioritize { index, priority }),
            (
                any::<usize>(),
                prop_oneof![
                    Just(WaitlistStatus::Notified),
                    Just(WaitlistStatus::Seated),
                    Just(WaitlistStatus::Cancelled),
                    Just(WaitlistStatus::NoShow),
                ]
            )
                .prop_map(|(index, status)| Op::Leave { index, status }),
        ]
    }

    proptest! {
        #[test]
        fn prop_positions_are_a_permutation(ops in prop::collection::vec(op(), 1..60)) {
            let mut entries: Vec<WaitlistEntry> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Enqueue { priority } => {
                        let mut e = entry(&format!("e{step}"), 2, priority, step as i64);
                        e.position = Some(next_position(&entries));
                        entries.push(e);
                    }
                    Op::Reprioritize { index, priority } if !entries.is_empty() => {
                        let i = index % entries.len();
                        entries[i].priority = priority;
                    }
                    Op::Leave { index, status } if !entries.is_empty() => {
                        let i = index % entries.len();
                        if entries[i].status.can_transition_to(status) {
                            entries[i].apply_status(status, base());
                        }
                    }
                    _ => {}
                }

                let updates = assign_positions(&entries);
                apply_positions(&mut entries, &updates);

                let mut waiting: Vec<&WaitlistEntry> = entries
                    .iter()
                    .filter(|e| e.status == WaitlistStatus::Waiting)
                    .collect();
                waiting.sort_by_key(|e| e.position);

                for (i, e) in waiting.iter().enumerate() {
                    prop_assert_eq!(e.position, Some(i as i32 + 1));
                }
                for pair in waiting.windows(2) {
                    prop_assert!(
                        pair[0].priority > pair[1].priority
                            || (pair[0].priority == pair[1].priority
                                && pair[0].created_at <= pair[1].created_at)
                    );
                }
            }
        }

        #[test]
        fn prop_estimate_never_exceeds_cap(
            similar in 0usize..500,
            turnover in 0.1f64..1000.0,
            tables in 0usize..50,
        ) {
            let policy = WaitlistPolicy::default();
            let minutes = estimate_wait(similar, turnover, tables, &policy);
            prop_assert!(minutes.is_some());
            prop_assert!(minutes.unwrap() <= 240);
            prop_assert!(minutes.unwrap() >= 0);
        }
    }
}
