//! Command implementations behind the CLI.
//!
//! Loading and analysis are kept apart from rendering so tests can drive the
//! whole pipeline without spawning a process.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::analyzer::{DateRange, StateDurationAnalyzer, TimeBasis};
use crate::cli::AnalyzeArgs;
use crate::clock::BusinessHoursWindow;
use crate::config::{ConfigOverrides, DwellConfig};
use crate::domain::IssueAnalysis;
use crate::errors::{
    input_not_array, input_not_found, invalid_date, invalid_json, invalid_range, ActionableError,
};
use crate::export::write_csv;
use crate::output::{write_stdout, JsonOutput, OutputContext};
use crate::summary::{format_duration, rank_by_basis, summarize_by_state, StateSummary};
use crate::timestamp::{parse_range_end, parse_range_start};

/// Results of one `analyze` run, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub basis: TimeBasis,
    pub window: BusinessHoursWindow,
    pub results: Vec<IssueAnalysis>,
}

impl AnalysisRun {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn summaries(&self) -> Vec<StateSummary> {
        let mut summaries = summarize_by_state(&self.results);
        rank_by_basis(&mut summaries, self.basis);
        summaries
    }
}

/// Read a JSON array of issue objects from `path`.
pub fn load_issues(path: &Path) -> Result<Vec<Value>> {
    let display = path.display().to_string();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(input_not_found(&display).into())
        }
        Err(err) => return Err(err).with_context(|| format!("Failed to read {}", display)),
    };

    let value: Value =
        serde_json::from_str(&content).map_err(|err| invalid_json(&display, &err.to_string()))?;

    match value {
        Value::Array(issues) => Ok(issues),
        _ => Err(input_not_array(&display).into()),
    }
}

/// Parse `--from`/`--to` into an inclusive range.
pub fn resolve_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange, ActionableError> {
    let start = from
        .map(|raw| parse_range_start(raw).map_err(|_| invalid_date("--from", raw)))
        .transpose()?;
    let end = to
        .map(|raw| parse_range_end(raw).map_err(|_| invalid_date("--to", raw)))
        .transpose()?;

    if let (Some(start), Some(end), Some(from), Some(to)) = (start, end, from, to) {
        if start > end {
            return Err(invalid_range(from, to));
        }
    }

    Ok(DateRange::new(start, end))
}

/// Load the input file and analyze every issue in it.
pub fn analyze_file(args: &AnalyzeArgs, config: &DwellConfig) -> Result<AnalysisRun> {
    let overrides = ConfigOverrides {
        start_hour: args.start_hour,
        end_hour: args.end_hour,
        state_field: args.state_field.clone(),
        business_hours: args.business_hours,
    };
    let analyzer = StateDurationAnalyzer::new(config.analyzer_config(&overrides)?);
    let range = resolve_range(args.from.as_deref(), args.to.as_deref())?;
    let issues = load_issues(&args.input)?;

    let results = analyzer.analyze_values(&issues, &range);

    Ok(AnalysisRun {
        basis: analyzer.basis(),
        window: analyzer.config().window,
        results,
    })
}

/// Write the run to the requested destination in the requested format.
pub fn render(run: &AnalysisRun, args: &AnalyzeArgs, ctx: &OutputContext) -> Result<()> {
    if args.json {
        let data = JsonData {
            run,
            summary: args.summary.then(|| run.summaries()),
        };
        let json = JsonOutput::success(data, "analyze").to_json_string()?;
        return match &args.output {
            Some(path) => write_file(path, |w| Ok(writeln!(w, "{}", json)?)),
            None => Ok(write_stdout(&json)?),
        };
    }

    match &args.output {
        Some(path) => {
            write_file(path, |w| write_csv(w, &run.results, run.basis))?;
            let _ = ctx.print_info(format!("Results saved to {}", path.display()));
        }
        // A summary on stdout replaces the CSV there; pass -o to get both.
        None if !args.summary => {
            let stdout = io::stdout();
            write_csv(stdout.lock(), &run.results, run.basis)?;
        }
        None => {}
    }

    if args.summary {
        ctx.print_data(format_summary_table(&run.summaries(), run.basis))?;
    }

    let _ = ctx.print_info(format!(
        "Analyzed {} issue(s), {} failed",
        run.results.len(),
        run.failed()
    ));
    Ok(())
}

#[derive(Serialize)]
struct JsonData<'a> {
    #[serde(flatten)]
    run: &'a AnalysisRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Vec<StateSummary>>,
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Human-readable per-state table.
pub fn format_summary_table(summaries: &[StateSummary], basis: TimeBasis) -> String {
    let width = summaries
        .iter()
        .map(|s| s.state.chars().count())
        .max()
        .unwrap_or(0)
        .max("STATE".len());

    let mut table = format!(
        "{:<width$}  {:>9}  {:>4}  {:>10}  {:>9}",
        "STATE", "INTERVALS", "OPEN", "TOTAL DAYS", "MEAN DAYS"
    );
    if basis.includes_business_hours() {
        table.push_str("  BUSINESS TIME");
    }

    for s in summaries {
        table.push_str(&format!(
            "\n{:<width$}  {:>9}  {:>4}  {:>10.2}  {:>9.2}",
            s.state, s.intervals, s.open_intervals, s.total_calendar_days, s.mean_calendar_days
        ));
        if basis.includes_business_hours() {
            table.push_str(&format!("  {}", format_duration(s.total_business_hours)));
        }
    }
    table
}
