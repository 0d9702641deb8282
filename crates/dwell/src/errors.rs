//! Error taxonomy.
//!
//! Library errors are typed:
//! - [`ExtractError`] is fatal to one issue's extraction.
//! - [`BatchItemError`] wraps anything that can fail while processing one
//!   issue in a batch; the batch analyzer turns it into a failure record and
//!   never lets it escape.
//!
//! CLI-facing problems (unreadable input, bad flags) are reported as
//! [`ActionableError`]s carrying possible causes and remediation steps.

use std::fmt;
use thiserror::Error;

use crate::config::CONFIG_FILE_NAME;
use crate::output::{ErrorCode, ExitCode};

/// A record that cannot yield a timeline at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid timestamp format in '{field}': '{raw}'")]
    TimestampParse { field: &'static str, raw: String },
}

/// Failure while analyzing a single issue inside a batch.
#[derive(Debug, Error)]
pub enum BatchItemError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Malformed issue record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An error with diagnostic context and remediation steps.
///
/// # Example
///
/// ```
/// use dwell::errors::ActionableError;
/// use dwell::output::ErrorCode;
///
/// let error = ActionableError::new(ErrorCode::INVALID_INPUT, "issues.json is not a JSON array")
///     .with_cause("The file contains a single issue object")
///     .with_remedy("Wrap the issue in [ ... ]");
///
/// assert!(error.to_error_message().contains("To fix:"));
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    /// Machine-readable code (see [`ErrorCode`])
    code: &'static str,
    error: String,
    causes: Vec<String>,
    remediation: Vec<String>,
}

impl ActionableError {
    pub fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
            causes: Vec::new(),
            remediation: Vec::new(),
        }
    }

    /// Add a possible cause (diagnostic hint).
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a remediation step (actionable fix).
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remediation.push(remedy.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.error
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    pub fn remediation(&self) -> &[String] {
        &self.remediation
    }

    pub fn exit_code(&self) -> ExitCode {
        ErrorCode::to_exit_code(self.code)
    }

    /// Convert to a formatted error message suitable for display.
    pub fn to_error_message(&self) -> String {
        let mut msg = format!("{}\n", self.error);

        if !self.causes.is_empty() {
            msg.push_str("\nPossible causes:\n");
            for cause in &self.causes {
                msg.push_str(&format!("  • {}\n", cause));
            }
        }

        if !self.remediation.is_empty() {
            msg.push_str("\nTo fix:\n");
            for remedy in &self.remediation {
                msg.push_str(&format!("  • {}\n", remedy));
            }
        }

        msg
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error_message())
    }
}

impl std::error::Error for ActionableError {}

pub fn input_not_found(path: &str) -> ActionableError {
    ActionableError::new(ErrorCode::NOT_FOUND, format!("Input file not found: {}", path))
        .with_cause("The path may be misspelled")
        .with_cause("The export may have been written to a different directory")
        .with_remedy("Check the path: ls -l <file>")
}

pub fn config_not_found(path: &str) -> ActionableError {
    ActionableError::new(ErrorCode::NOT_FOUND, format!("Config file not found: {}", path))
        .with_cause("The --config path may be misspelled")
        .with_remedy(format!(
            "Create it, or omit --config to use ./{}",
            CONFIG_FILE_NAME
        ))
}

pub fn invalid_json(path: &str, detail: &str) -> ActionableError {
    ActionableError::new(
        ErrorCode::INVALID_INPUT,
        format!("Invalid JSON in {}: {}", path, detail),
    )
    .with_cause("The export was truncated or hand-edited")
    .with_remedy(format!("Validate the file: jq empty {}", path))
}

pub fn input_not_array(path: &str) -> ActionableError {
    ActionableError::new(
        ErrorCode::INVALID_INPUT,
        format!("Input file must contain a JSON array of issues: {}", path),
    )
    .with_cause("The file holds a single issue object instead of a list")
    .with_cause("The file holds a search response envelope (e.g. {\"issues\": [...]})")
    .with_remedy(format!("Extract the list: jq '.issues' {}", path))
}

pub fn invalid_date(flag: &str, raw: &str) -> ActionableError {
    ActionableError::new(
        ErrorCode::INVALID_ARGUMENT,
        format!("Invalid date for {}: '{}'", flag, raw),
    )
    .with_remedy("Use YYYY-MM-DD (e.g. 2024-01-31)")
    .with_remedy("Or a full RFC 3339 timestamp (e.g. 2024-01-31T17:00:00Z)")
}

pub fn invalid_range(from: &str, to: &str) -> ActionableError {
    ActionableError::new(
        ErrorCode::INVALID_ARGUMENT,
        format!("Date range is empty: --from {} is after --to {}", from, to),
    )
    .with_remedy("Swap the two dates")
}

pub fn invalid_window(detail: impl fmt::Display) -> ActionableError {
    ActionableError::new(ErrorCode::CONFIG_ERROR, detail.to_string())
        .with_cause("--start-hour/--end-hour or [business_hours] in the config file are inconsistent")
        .with_remedy("Use hours between 0 and 23 with start before end (e.g. 9 and 17)")
}
