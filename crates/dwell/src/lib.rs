//! Time-in-state analysis for issue histories.
//!
//! Turns issue changelogs into an ordered list of state transitions, then into
//! per-state intervals measured in calendar days and business hours.
//! The binary wraps this library; tests drive it directly.

pub mod analyzer;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod domain;
pub mod durations;
pub mod errors;
pub mod export;
pub mod extract;
pub mod output;
pub mod summary;
pub mod timestamp;

// Re-export commonly used types
pub use analyzer::{AnalyzerConfig, DateRange, StateDurationAnalyzer, TimeBasis};
pub use clock::{business_hours, BusinessHoursWindow};
pub use domain::{IssueAnalysis, IssueRecord, IssueReport, StateDuration, StateTransition};
pub use durations::calculate_durations;
pub use errors::{ActionableError, BatchItemError, ExtractError};
pub use extract::extract_transitions;
pub use output::{ExitCode, JsonError, JsonOutput};
pub use timestamp::{parse_timestamp, Timestamp};
