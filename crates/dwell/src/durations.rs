//! Per-state intervals derived from a transition timeline.
//!
//! Transition `i` opens an interval that transition `i + 1` closes. The last
//! interval stays open and is measured up to "now".

use chrono::{DateTime, Duration, Utc};

use crate::clock::{business_hours, BusinessHoursWindow};
use crate::domain::{StateDuration, StateTransition};
use crate::timestamp::Timestamp;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Compute one [`StateDuration`] per transition, measuring open intervals up
/// to the current instant.
pub fn calculate_durations(
    transitions: &[StateTransition],
    window: &BusinessHoursWindow,
) -> Vec<StateDuration> {
    calculate_durations_at(transitions, window, Utc::now())
}

/// Like [`calculate_durations`], with an explicit reference instant for the
/// still-open last interval.
pub fn calculate_durations_at(
    transitions: &[StateTransition],
    window: &BusinessHoursWindow,
    now: DateTime<Utc>,
) -> Vec<StateDuration> {
    transitions
        .iter()
        .enumerate()
        .map(|(i, transition)| {
            let start_time = transition.timestamp;
            let end_time = transitions.get(i + 1).map(|next| next.timestamp);
            let until = end_time.unwrap_or_else(|| now.with_timezone(start_time.offset()));

            StateDuration {
                state: transition.to_state.clone(),
                start_time,
                end_time,
                calendar_days: calendar_days(&start_time, &until),
                business_hours: business_hours(&start_time, &until, window),
            }
        })
        .collect()
}

/// Elapsed real time in fractional days; zero for empty or reversed spans.
pub fn calendar_days(start: &Timestamp, end: &Timestamp) -> f64 {
    let span = end.signed_duration_since(*start);
    if span <= Duration::zero() {
        return 0.0;
    }
    span.num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn transition(at: &str, from: Option<&str>, to: &str) -> StateTransition {
        StateTransition {
            timestamp: ts(at),
            from_state: from.map(str::to_string),
            to_state: to.to_string(),
            author: None,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        ts("2024-02-01T00:00:00Z").with_timezone(&Utc)
    }

    #[test]
    fn test_empty_transitions() {
        let durations = calculate_durations(&[], &BusinessHoursWindow::default());
        assert!(durations.is_empty());
    }

    #[test]
    fn test_single_open_state() {
        let transitions = vec![transition("2024-01-01T09:00:00Z", None, "To Do")];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());

        assert_eq!(durations.len(), 1);
        assert_eq!(durations[0].state, "To Do");
        assert!(durations[0].is_open());
        assert_eq!(durations[0].calendar_days, 31.0 - 9.0 / 24.0);
        assert!(durations[0].business_hours > 0.0);
    }

    #[test]
    fn test_open_state_measured_to_real_now() {
        let transitions = vec![transition("2024-01-01T09:00:00Z", None, "To Do")];
        let durations = calculate_durations(&transitions, &BusinessHoursWindow::default());
        assert!(durations[0].calendar_days > 0.0);
        assert!(durations[0].business_hours > 0.0);
    }

    #[test]
    fn test_consecutive_intervals() {
        let transitions = vec![
            transition("2024-01-01T09:00:00Z", None, "To Do"),
            transition("2024-01-02T10:00:00Z", Some("To Do"), "In Progress"),
            transition("2024-01-03T15:00:00Z", Some("In Progress"), "Done"),
        ];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());

        assert_eq!(durations.len(), 3);
        assert_eq!(durations[0].end_time, Some(transitions[1].timestamp));
        assert_eq!(durations[0].calendar_days, 25.0 / 24.0);
        // Mon 9-17 plus Tue 9-10
        assert_eq!(durations[0].business_hours, 9.0);
        assert_eq!(durations[1].start_time, transitions[1].timestamp);
        assert_eq!(durations[1].end_time, Some(transitions[2].timestamp));
        // Tue 10-17 plus Wed 9-15
        assert_eq!(durations[1].business_hours, 13.0);
        assert!(durations[2].is_open());
    }

    #[test]
    fn test_weekend_span() {
        let transitions = vec![
            transition("2024-01-05T16:00:00Z", None, "Review"),
            transition("2024-01-08T10:00:00Z", Some("Review"), "Done"),
        ];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());

        assert!((durations[0].calendar_days - 66.0 / 24.0).abs() < 1e-9);
        assert_eq!(durations[0].business_hours, 2.0);
    }

    #[test]
    fn test_shared_timestamp_yields_zero_interval() {
        let transitions = vec![
            transition("2024-01-01T09:00:00Z", None, "A"),
            transition("2024-01-02T10:00:00Z", Some("A"), "B"),
            transition("2024-01-02T10:00:00Z", Some("B"), "C"),
        ];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());

        assert_eq!(durations[1].state, "B");
        assert_eq!(durations[1].calendar_days, 0.0);
        assert_eq!(durations[1].business_hours, 0.0);
    }

    #[test]
    fn test_mixed_offsets_subtract_as_instants() {
        // 09:00-05:00 is 14:00Z; 10:00+01:00 next day is 09:00Z
        let transitions = vec![
            transition("2024-01-01T09:00:00-05:00", None, "To Do"),
            transition("2024-01-02T10:00:00+01:00", Some("To Do"), "Done"),
        ];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());

        assert_eq!(durations[0].calendar_days, 19.0 / 24.0);
    }

    #[test]
    fn test_future_start_yields_zero() {
        let transitions = vec![transition("2030-01-01T09:00:00Z", None, "Planned")];
        let durations =
            calculate_durations_at(&transitions, &BusinessHoursWindow::default(), fixed_now());
        assert_eq!(durations[0].calendar_days, 0.0);
        assert_eq!(durations[0].business_hours, 0.0);
    }

    #[test]
    fn test_custom_window_applies() {
        let window = BusinessHoursWindow::new(7, 19).unwrap();
        let transitions = vec![
            transition("2024-01-03T07:00:00Z", None, "Open"),
            transition("2024-01-03T19:00:00Z", Some("Open"), "Closed"),
        ];
        let durations = calculate_durations_at(&transitions, &window, fixed_now());
        assert_eq!(durations[0].business_hours, 12.0);
    }
}

// Include property-based tests
#[cfg(test)]
#[path = "durations_proptests.rs"]
mod proptests;
