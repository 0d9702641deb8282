//! Tabular export of analysis results.
//!
//! One row per state interval:
//! `Issue Key, State, Start Time, End Time, Calendar Days[, Business Hours]`.
//! Open intervals show [`CURRENT_SENTINEL`] as their end time. Failure
//! records produce no rows. Key and state cells are guarded against formula
//! injection.

use anyhow::{Context, Result};
use std::io::Write;

use crate::analyzer::TimeBasis;
use crate::domain::{IssueAnalysis, StateDuration};

/// End-time cell for an interval that has not ended.
pub const CURRENT_SENTINEL: &str = "Current";

const BASE_HEADERS: [&str; 5] = ["Issue Key", "State", "Start Time", "End Time", "Calendar Days"];
const BUSINESS_HOURS_HEADER: &str = "Business Hours";

/// Leading characters that spreadsheet applications evaluate as formulas.
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Prefix a text cell with `'` if a spreadsheet would read it as a formula.
pub fn protect_cell(value: &str) -> String {
    if value.starts_with(&FORMULA_PREFIXES[..]) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Column headers for the given basis.
pub fn headers(basis: TimeBasis) -> Vec<&'static str> {
    let mut headers = BASE_HEADERS.to_vec();
    if basis.includes_business_hours() {
        headers.push(BUSINESS_HOURS_HEADER);
    }
    headers
}

/// A rendered export row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub issue_key: String,
    pub state: String,
    pub start_time: String,
    pub end_time: String,
    pub calendar_days: String,
    pub business_hours: Option<String>,
}

impl ExportRow {
    fn render(issue_key: &str, duration: &StateDuration, basis: TimeBasis) -> Self {
        Self {
            issue_key: protect_cell(issue_key),
            state: protect_cell(&duration.state),
            start_time: duration.start_time.to_rfc3339(),
            end_time: duration
                .end_time
                .map(|end| end.to_rfc3339())
                .unwrap_or_else(|| CURRENT_SENTINEL.to_string()),
            calendar_days: format!("{:.2}", duration.calendar_days),
            business_hours: basis
                .includes_business_hours()
                .then(|| format!("{:.2}", duration.business_hours)),
        }
    }

    pub fn cells(&self) -> Vec<&str> {
        let mut cells = vec![
            self.issue_key.as_str(),
            self.state.as_str(),
            self.start_time.as_str(),
            self.end_time.as_str(),
            self.calendar_days.as_str(),
        ];
        if let Some(hours) = &self.business_hours {
            cells.push(hours.as_str());
        }
        cells
    }
}

/// Render every successful interval as a row, in result order.
pub fn rows(results: &[IssueAnalysis], basis: TimeBasis) -> Vec<ExportRow> {
    results
        .iter()
        .filter_map(IssueAnalysis::report)
        .flat_map(|report| {
            report
                .durations
                .iter()
                .map(move |duration| ExportRow::render(&report.issue_key, duration, basis))
        })
        .collect()
}

/// Write results as CSV (header row included).
pub fn write_csv<W: Write>(writer: W, results: &[IssueAnalysis], basis: TimeBasis) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(headers(basis))
        .context("Failed to write CSV header")?;
    for row in rows(results, basis) {
        csv.write_record(row.cells())
            .context("Failed to write CSV row")?;
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Render results as a CSV string.
pub fn to_csv_string(results: &[IssueAnalysis], basis: TimeBasis) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, results, basis)?;
    String::from_utf8(buffer).context("CSV output is not valid UTF-8")
}
