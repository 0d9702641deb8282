//! Command-line interface definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Time-in-state analysis for issue histories
///
/// Reads a JSON array of issues (with expanded changelogs) and reports how
/// long each issue spent in each workflow state, in calendar days and
/// optionally in business hours.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or unusable input
///   3  - Input file not found
///   4  - Validation failed (inconsistent configuration)
///  10  - External dependency failed (file system)
#[derive(Parser)]
#[command(name = "dwell")]
#[command(about = "Time-in-state analysis for issue histories", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file (default: ./dwell.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute time spent in each state for every issue in a JSON export
    ///
    /// Writes one CSV row per state interval:
    ///   Issue Key, State, Start Time, End Time, Calendar Days[, Business Hours]
    /// Intervals that have not ended show "Current" as their end time.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// JSON file containing an array of issues
    pub input: PathBuf,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only keep transitions at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from: Option<String>,

    /// Only keep transitions at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub to: Option<String>,

    /// Include business hours in the report
    #[arg(long)]
    pub business_hours: bool,

    /// First hour of the business day, 0-23 (overrides config)
    #[arg(long)]
    pub start_hour: Option<u32>,

    /// Hour the business day ends, 0-23 (overrides config)
    #[arg(long)]
    pub end_hour: Option<u32>,

    /// Changelog field that carries state changes (default: status)
    #[arg(long)]
    pub state_field: Option<String>,

    /// Output JSON format
    #[arg(long)]
    pub json: bool,

    /// Print per-state totals
    #[arg(long)]
    pub summary: bool,
}
