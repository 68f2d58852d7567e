//! Command-line front end for the wardpack integration engine.
//!
//! # Responsibility
//! - Parse arguments, initialize logging and hand off to the core pipeline.
//! - Map run outcomes to exit codes: 0 clean, 2 on hard violations, 1 on
//!   any other failure.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use std::process::ExitCode;
use wardpack_core::config::IntegrateConfig;
use wardpack_core::pipeline::{run_pipeline, PipelineError, PipelineOptions};

use crate::cli::{Cli, Commands, RunArgs};

const EXIT_VIOLATIONS: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = init_logging(&cli) {
        eprintln!("wardpack: {message}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Integrate(args) => run(&args, false),
        Commands::Check(args) => run(&args, true),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_error error={err:#}");
            eprintln!("wardpack: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), String> {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| wardpack_core::default_log_level().to_string());
    wardpack_core::init_logging(&level, &cli.log_dir.to_string_lossy())
}

fn run(args: &RunArgs, check_only: bool) -> Result<ExitCode> {
    if !check_only && args.out.is_none() {
        anyhow::bail!("`integrate` requires --out; use `check` for a dry run");
    }
    let config = load_config(args)?;
    let options = PipelineOptions {
        package_dirs: args.packages.clone(),
        directives_path: args.directives.clone(),
        out_path: if check_only { None } else { args.out.clone() },
        config,
    };

    match run_pipeline(&options) {
        Ok(outcome) => {
            print!("{}", outcome.report.render_text());
            if let Some(report_path) = &args.report {
                let json = serde_json::to_string_pretty(&outcome.report)
                    .context("serializing integration report")?;
                std::fs::write(report_path, json).with_context(|| {
                    format!("writing report to `{}`", report_path.display())
                })?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(PipelineError::ValidationFailed { report, .. }) => {
            print!("{}", report.render_text());
            eprintln!(
                "wardpack: {} hard violation(s); no output written",
                report.validation.violations.len()
            );
            Ok(ExitCode::from(EXIT_VIOLATIONS))
        }
        Err(err) => Err(err.into()),
    }
}

fn load_config(args: &RunArgs) -> Result<IntegrateConfig> {
    let Some(path) = &args.config else {
        return Ok(IntegrateConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config `{}`", path.display()))?;
    let config: IntegrateConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config `{}`", path.display()))?;
    Ok(config)
}
