//! Per-state aggregates over a batch.
//!
//! Pure functions over analysis results, independent of how they are printed.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzer::TimeBasis;
use crate::domain::IssueAnalysis;

/// Totals for one state name across all successful issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub state: String,
    /// Number of intervals spent in this state
    pub intervals: usize,
    /// Intervals that have not ended yet
    pub open_intervals: usize,
    pub total_calendar_days: f64,
    pub mean_calendar_days: f64,
    pub total_business_hours: f64,
}

/// Aggregate durations by state name, sorted by state name.
pub fn summarize_by_state(results: &[IssueAnalysis]) -> Vec<StateSummary> {
    let mut by_state: BTreeMap<&str, StateSummary> = BTreeMap::new();

    for duration in results
        .iter()
        .filter_map(IssueAnalysis::report)
        .flat_map(|report| report.durations.iter())
    {
        let entry = by_state
            .entry(duration.state.as_str())
            .or_insert_with(|| StateSummary {
                state: duration.state.clone(),
                intervals: 0,
                open_intervals: 0,
                total_calendar_days: 0.0,
                mean_calendar_days: 0.0,
                total_business_hours: 0.0,
            });
        entry.intervals += 1;
        if duration.is_open() {
            entry.open_intervals += 1;
        }
        entry.total_calendar_days += duration.calendar_days;
        entry.total_business_hours += duration.business_hours;
    }

    by_state
        .into_values()
        .map(|mut summary| {
            summary.mean_calendar_days = summary.total_calendar_days / summary.intervals as f64;
            summary
        })
        .collect()
}

/// Order summaries by the figure the basis leads with, largest first.
pub fn rank_by_basis(summaries: &mut [StateSummary], basis: TimeBasis) {
    let key = |s: &StateSummary| match basis {
        TimeBasis::Calendar => s.total_calendar_days,
        TimeBasis::BusinessHours => s.total_business_hours,
    };
    summaries.sort_by(|a, b| key(b).total_cmp(&key(a)));
}

/// Render a duration in hours as e.g. `2d 3h 15m`.
pub fn format_duration(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).floor() as u64;
    let days = total_minutes / (24 * 60);
    let remaining_hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if remaining_hours > 0 {
        parts.push(format!("{}h", remaining_hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }

    if parts.is_empty() {
        "0m".to_string()
    } else {
        parts.join(" ")
    }
}
