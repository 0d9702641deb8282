//! Property-based tests for interval decomposition and the business-hours clock
//!
//! Timelines are generated as sorted offsets from a fixed Monday so that every
//! run covers weekends, day boundaries and shared timestamps.

use super::*;
use crate::timestamp::parse_timestamp;
use proptest::prelude::*;

fn epoch() -> Timestamp {
    parse_timestamp("2024-01-01T00:00:00Z").unwrap()
}

fn fixed_now() -> DateTime<Utc> {
    parse_timestamp("2024-06-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

// Generator for minute offsets within roughly three months
fn offsets_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..130_000, 1..12).prop_map(|mut offsets| {
        offsets.sort_unstable();
        offsets
    })
}

// Generator for a valid window
fn window_strategy() -> impl Strategy<Value = BusinessHoursWindow> {
    (0u32..23)
        .prop_flat_map(|start| (Just(start), (start + 1)..24))
        .prop_map(|(start, end)| BusinessHoursWindow::new(start, end).unwrap())
}

fn timeline(offsets: &[i64]) -> Vec<StateTransition> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, minutes)| StateTransition {
            timestamp: epoch() + Duration::minutes(*minutes),
            from_state: (i > 0).then(|| format!("S{}", i - 1)),
            to_state: format!("S{}", i),
            author: None,
        })
        .collect()
}

// Property 1: one interval per transition, each closed by its successor
proptest! {
    #[test]
    fn prop_intervals_are_adjacent(offsets in offsets_strategy(), window in window_strategy()) {
        let transitions = timeline(&offsets);
        let durations = calculate_durations_at(&transitions, &window, fixed_now());

        prop_assert_eq!(durations.len(), transitions.len());
        for i in 0..durations.len() - 1 {
            prop_assert_eq!(durations[i].end_time, Some(transitions[i + 1].timestamp));
            prop_assert_eq!(durations[i].start_time, transitions[i].timestamp);
        }
        prop_assert!(durations.last().unwrap().end_time.is_none());
        prop_assert!(durations.iter().all(|d| d.calendar_days >= 0.0 && d.business_hours >= 0.0));
    }
}

// Property 2: no business time in an empty or reversed span
proptest! {
    #[test]
    fn prop_business_hours_zero_when_not_forward(
        a in 0i64..130_000,
        back in 0i64..10_000,
        window in window_strategy()
    ) {
        let start = epoch() + Duration::minutes(a);
        let end = start - Duration::minutes(back);
        prop_assert_eq!(business_hours(&start, &end, &window), 0.0);
    }
}

// Property 3: extending the end never removes business time
proptest! {
    #[test]
    fn prop_business_hours_monotonic_in_end(
        a in 0i64..130_000,
        first in 0i64..20_000,
        extra in 0i64..20_000,
        window in window_strategy()
    ) {
        let start = epoch() + Duration::minutes(a);
        let near = start + Duration::minutes(first);
        let far = near + Duration::minutes(extra);

        let near_hours = business_hours(&start, &near, &window);
        let far_hours = business_hours(&start, &far, &window);
        prop_assert!(far_hours >= near_hours, "{} < {}", far_hours, near_hours);
        prop_assert!(near_hours <= (first as f64) / 60.0 + 1e-9);
    }
}
