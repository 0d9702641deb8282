//! Batch analysis: extraction and duration calculation over many issues.
//!
//! Each issue is processed independently. Anything that goes wrong with one
//! issue becomes an [`IssueFailure`] record in the output (at the same
//! position as the input) and the batch carries on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::BusinessHoursWindow;
use crate::domain::{
    IssueAnalysis, IssueFailure, IssueRecord, IssueReport, StateTransition, UNKNOWN_ISSUE_KEY,
};
use crate::durations::calculate_durations_at;
use crate::errors::BatchItemError;
use crate::extract::{extract_transitions, DEFAULT_STATE_FIELD};
use crate::timestamp::Timestamp;

/// Which elapsed-time figure a report leads with.
///
/// Business hours are always computed; the basis decides whether exports
/// carry the business-hours column and which figure summaries rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// Raw wall-clock time only (default)
    #[default]
    Calendar,
    /// Wall-clock time plus time inside the business-hours window
    BusinessHours,
}

impl TimeBasis {
    pub fn includes_business_hours(self) -> bool {
        self == TimeBasis::BusinessHours
    }
}

/// Immutable analyzer settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub window: BusinessHoursWindow,
    pub basis: TimeBasis,
    /// Changelog field carrying state changes
    pub state_field: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window: BusinessHoursWindow::default(),
            basis: TimeBasis::default(),
            state_field: DEFAULT_STATE_FIELD.to_string(),
        }
    }
}

/// Inclusive time bounds applied to transitions before durations are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl DateRange {
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// `from <= at <= to`, each bound optional.
    pub fn contains(&self, at: &Timestamp) -> bool {
        self.from.map_or(true, |from| *at >= from) && self.to.map_or(true, |to| *at <= to)
    }

    /// Keep only transitions inside the range, preserving order.
    pub fn filter(&self, transitions: Vec<StateTransition>) -> Vec<StateTransition> {
        if self.is_unbounded() {
            return transitions;
        }
        transitions
            .into_iter()
            .filter(|transition| self.contains(&transition.timestamp))
            .collect()
    }
}

/// Computes time-in-state for batches of issues.
///
/// Holds only read-only configuration, so one instance can serve any number
/// of sequential batches.
///
/// # Example
///
/// ```
/// use dwell::analyzer::{AnalyzerConfig, DateRange, StateDurationAnalyzer};
/// use dwell::domain::IssueRecord;
///
/// let issue: IssueRecord = serde_json::from_str(r#"{
///     "key": "PROJ-1",
///     "fields": {"created": "2024-01-01T09:00:00Z", "status": {"name": "Open"}}
/// }"#).unwrap();
///
/// let analyzer = StateDurationAnalyzer::new(AnalyzerConfig::default());
/// let results = analyzer.analyze(&[issue], &DateRange::unbounded());
///
/// let report = results[0].report().unwrap();
/// assert_eq!(report.durations.len(), 1);
/// assert!(report.durations[0].end_time.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateDurationAnalyzer {
    config: AnalyzerConfig,
}

impl StateDurationAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn basis(&self) -> TimeBasis {
        self.config.basis
    }

    /// Analyze one issue, propagating failures to the caller.
    pub fn analyze_issue(
        &self,
        record: &IssueRecord,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Result<IssueReport, BatchItemError> {
        let extraction = extract_transitions(record, &self.config.state_field)?;
        let transitions = range.filter(extraction.transitions);
        let durations = calculate_durations_at(&transitions, &self.config.window, now);

        Ok(IssueReport {
            issue_key: record.key_or_unknown(),
            summary: record.summary(),
            transitions,
            durations,
            skipped_events: extraction.skipped,
        })
    }

    /// Analyze a batch of typed records, measuring open intervals up to now.
    pub fn analyze(&self, issues: &[IssueRecord], range: &DateRange) -> Vec<IssueAnalysis> {
        self.analyze_at(issues, range, Utc::now())
    }

    /// Analyze a batch of typed records with an explicit reference instant.
    pub fn analyze_at(
        &self,
        issues: &[IssueRecord],
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Vec<IssueAnalysis> {
        let results: Vec<_> = issues
            .iter()
            .map(|record| {
                reify(
                    record.key_or_unknown(),
                    self.analyze_issue(record, range, now),
                )
            })
            .collect();
        log_batch(&results);
        results
    }

    /// Analyze loosely typed JSON records.
    ///
    /// A value that does not even have the shape of an issue record becomes a
    /// failure record, like any other per-item problem.
    pub fn analyze_values(&self, issues: &[Value], range: &DateRange) -> Vec<IssueAnalysis> {
        self.analyze_values_at(issues, range, Utc::now())
    }

    pub fn analyze_values_at(
        &self,
        issues: &[Value],
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Vec<IssueAnalysis> {
        let results: Vec<_> = issues
            .iter()
            .map(|value| match IssueRecord::deserialize(value) {
                Ok(record) => reify(
                    record.key_or_unknown(),
                    self.analyze_issue(&record, range, now),
                ),
                Err(err) => reify(key_of(value), Err(BatchItemError::Malformed(err))),
            })
            .collect();
        log_batch(&results);
        results
    }
}

fn reify(issue_key: String, result: Result<IssueReport, BatchItemError>) -> IssueAnalysis {
    match result {
        Ok(report) => {
            debug!(
                issue = %issue_key,
                intervals = report.durations.len(),
                "Analyzed issue"
            );
            for skipped in &report.skipped_events {
                warn!(
                    issue = %issue_key,
                    history_index = skipped.history_index,
                    reason = ?skipped.reason,
                    "Skipped changelog event"
                );
            }
            IssueAnalysis::Success(report)
        }
        Err(err) => {
            warn!(issue = %issue_key, error = %err, "Failed to analyze issue");
            IssueAnalysis::Failed(IssueFailure {
                issue_key,
                error: err.to_string(),
            })
        }
    }
}

fn key_of(value: &Value) -> String {
    value
        .get("key")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ISSUE_KEY)
        .to_string()
}

fn log_batch(results: &[IssueAnalysis]) {
    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
        total = results.len(),
        succeeded = results.len() - failed,
        failed,
        "Analyzed batch"
    );
}
