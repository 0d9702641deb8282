use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use dwell::cli::{Cli, Commands};
use dwell::commands::{analyze_file, render};
use dwell::config::{DwellConfig, CONFIG_FILE_NAME};
use dwell::errors::ActionableError;
use dwell::output::{is_broken_pipe, write_stdout, ErrorCode, OutputContext};
use dwell::{ExitCode, JsonError};

/// Environment variable holding the log filter (e.g. `DWELL_LOG=debug`).
const LOG_ENV: &str = "DWELL_LOG";

fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    if let Some(actionable) = error.downcast_ref::<ActionableError>() {
        return actionable.exit_code();
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            _ => ExitCode::ExternalError,
        };
    }

    ExitCode::GenericError
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let json = match &cli.command {
        Commands::Analyze(args) => args.json,
    };

    let exit_code = match run(cli) {
        Ok(()) => ExitCode::Success,
        // Reader went away (e.g. `| head`)
        Err(e) if is_broken_pipe(&e) => ExitCode::Success,
        Err(e) => {
            let code = error_to_exit_code(&e);
            if json {
                let error = match e.downcast_ref::<ActionableError>() {
                    Some(actionable) => JsonError::from_actionable(actionable, "analyze"),
                    None => JsonError::new(ErrorCode::INTERNAL_ERROR, format!("{:#}", e), "analyze"),
                };
                match error.to_json_string() {
                    Ok(body) => {
                        let _ = write_stdout(&body);
                    }
                    Err(_) => eprintln!("Error: {:#}", e),
                }
            } else {
                eprintln!("Error: {:#}", e);
            }
            code
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DwellConfig::load_explicit(path)?,
        None => DwellConfig::load(Path::new(CONFIG_FILE_NAME))?,
    };

    match cli.command {
        Commands::Analyze(args) => {
            let ctx = OutputContext::new(cli.quiet, args.json);
            let run = analyze_file(&args, &config)?;
            render(&run, &args, &ctx)
        }
    }
}
