//! CLI argument parsing for latencia

use crate::config::Settings;
use crate::loader::DataFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for region reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON object keyed by region (default)
    Json,
    /// Human-readable table
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "latencia")]
#[command(version)]
#[command(about = "Per-region latency and uptime summaries from telemetry batches", long_about = None)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable trace-level logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute per-region statistics for one request
    Query(QueryArgs),
    /// Show which fields the resolver picks in the telemetry source
    Schema(DataArgs),
    /// Serve the metrics endpoint over HTTP
    Serve(ServeArgs),
}

/// Telemetry source overrides
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Telemetry file (CSV, JSON or NDJSON)
    #[arg(short = 'd', long = "data", value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Telemetry format (default: detect)
    #[arg(long = "data-format", value_enum, value_name = "FORMAT")]
    pub data_format: Option<DataFormat>,

    /// Field rule pack (TOML) replacing the built-in discovery rules
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

impl DataArgs {
    /// Overlay command-line values on file settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.data {
            settings.data.path = path.clone();
        }
        if let Some(format) = self.data_format {
            settings.data.format = format;
        }
        if let Some(rules) = &self.rules {
            settings.schema.rules = Some(rules.clone());
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: DataArgs,

    /// Region to report on (repeatable, order preserved)
    #[arg(short = 'r', long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Latency threshold in milliseconds (default: 180)
    #[arg(short = 't', long = "threshold", value_name = "MS", allow_negative_numbers = true)]
    pub threshold_ms: Option<f64>,

    /// Read a JSON request body ({"regions": [...], "threshold_ms": N}) from file
    #[arg(long = "request", value_name = "FILE", conflicts_with_all = ["regions", "threshold_ms"])]
    pub request: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: DataArgs,

    /// Listen address (default: 127.0.0.1:8000)
    #[arg(short = 'l', long = "listen", value_name = "ADDR")]
    pub listen: Option<String>,

    /// Route accepting POST requests (default: /)
    #[arg(long = "route", value_name = "PATH")]
    pub route: Option<String>,
}

impl ServeArgs {
    pub fn apply(&self, settings: &mut Settings) {
        self.source.apply(settings);
        if let Some(listen) = &self.listen {
            settings.server.listen = listen.clone();
        }
        if let Some(route) = &self.route {
            settings.server.route = route.clone();
        }
    }
}
