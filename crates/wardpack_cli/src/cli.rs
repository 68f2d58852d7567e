use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wardpack")]
#[command(about = "Hospital-sim content package integrator", version)]
pub struct Cli {
    /// Directory for rolling log files.
    #[arg(long, default_value = "/tmp/wardpack/logs")]
    pub log_dir: PathBuf,

    /// Log level (trace|debug|info|warn|error). Defaults per build mode.
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Integrate packages and write an engine package.
    Integrate(RunArgs),
    /// Run the pipeline without writing an engine package.
    Check(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directories scanned recursively for package JSON files.
    #[arg(long, required = true, num_args = 1..)]
    pub packages: Vec<PathBuf>,

    /// Ordered curator directive file.
    #[arg(long)]
    pub directives: Option<PathBuf>,

    /// Engine package destination. Required for `integrate`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Integration config file (departments, shares, baseline weight).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the integration report as JSON next to the terminal summary.
    #[arg(long)]
    pub report: Option<PathBuf>,
}
