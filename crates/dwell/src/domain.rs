//! Core data types.
//!
//! Two families live here:
//! - the raw issue record as delivered by the tracker (every field optional,
//!   so gaps are reported by the extractor rather than by serde), and
//! - the analysis outputs: transitions, per-state durations, and the
//!   per-issue success or failure record produced by a batch run.

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Issue key reported when a record carries none.
pub const UNKNOWN_ISSUE_KEY: &str = "Unknown";

// ============================================================================
// Raw input records
// ============================================================================

/// One issue as exported by the tracker, with its expanded changelog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Tracker key (e.g. "PROJ-123")
    pub key: Option<String>,
    pub fields: Option<IssueFields>,
    pub changelog: Option<Changelog>,
}

impl IssueRecord {
    /// The issue key, or [`UNKNOWN_ISSUE_KEY`] if absent.
    pub fn key_or_unknown(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| UNKNOWN_ISSUE_KEY.to_string())
    }

    /// The issue summary, or an empty string if absent.
    pub fn summary(&self) -> String {
        self.fields
            .as_ref()
            .and_then(|fields| fields.summary.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    /// Creation timestamp (ISO-8601, offset optional)
    pub created: Option<String>,
    /// Current workflow state
    pub status: Option<StatusField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusField {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    pub histories: Option<Vec<History>>,
}

/// A single changelog entry: one actor, one instant, one or more field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub created: Option<String>,
    pub author: Option<Author>,
    pub items: Option<Vec<ChangeItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// A change to one field within a history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: Option<String>,
    #[serde(rename = "fromString")]
    pub from_name: Option<String>,
    #[serde(rename = "toString")]
    pub to_name: Option<String>,
}

// ============================================================================
// Analysis outputs
// ============================================================================

/// An entity entering a state at an instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub timestamp: Timestamp,
    /// Prior state; `None` only for the synthetic creation event
    pub from_state: Option<String>,
    pub to_state: String,
    /// Display name of whoever made the change
    pub author: Option<String>,
}

impl StateTransition {
    /// The synthetic event marking creation into `state`.
    pub fn creation(timestamp: Timestamp, state: impl Into<String>) -> Self {
        Self {
            timestamp,
            from_state: None,
            to_state: state.into(),
            author: None,
        }
    }

    pub fn is_creation(&self) -> bool {
        self.from_state.is_none()
    }
}

/// Time spent in one state between two consecutive transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDuration {
    pub state: String,
    pub start_time: Timestamp,
    /// `None` while the entity is still in this state
    pub end_time: Option<Timestamp>,
    pub calendar_days: f64,
    pub business_hours: f64,
}

impl StateDuration {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Why a changelog event was left out of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    MissingTimestamp,
    UnparsableTimestamp { raw: String },
    MissingTargetState,
}

/// A state-change event dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEvent {
    /// Position of the entry in `changelog.histories`
    pub history_index: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Successful analysis of one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub issue_key: String,
    pub summary: String,
    pub transitions: Vec<StateTransition>,
    pub durations: Vec<StateDuration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_events: Vec<SkippedEvent>,
}

/// An issue whose analysis failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFailure {
    pub issue_key: String,
    pub error: String,
}

/// Outcome of analyzing one issue within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueAnalysis {
    Success(IssueReport),
    Failed(IssueFailure),
}

impl IssueAnalysis {
    pub fn issue_key(&self) -> &str {
        match self {
            IssueAnalysis::Success(report) => &report.issue_key,
            IssueAnalysis::Failed(failure) => &failure.issue_key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IssueAnalysis::Success(_))
    }

    pub fn report(&self) -> Option<&IssueReport> {
        match self {
            IssueAnalysis::Success(report) => Some(report),
            IssueAnalysis::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            IssueAnalysis::Success(_) => None,
            IssueAnalysis::Failed(failure) => Some(&failure.error),
        }
    }
}
