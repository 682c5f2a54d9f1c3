//! Rendering region reports for the terminal

use crate::aggregate::RegionReport;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};

/// Render a report in the requested format
pub fn render(report: &RegionReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize region report")
        }
        OutputFormat::Text => Ok(render_text(report)),
    }
}

/// Fixed-width table, one line per requested region
pub fn render_text(report: &RegionReport) -> String {
    let width = report
        .regions()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        .max("region".len());

    let mut out = format!(
        "{:<width$}  {:>12}  {:>12}  {:>10}  {:>8}\n",
        "region",
        "avg_latency",
        "p95_latency",
        "avg_uptime",
        "breaches",
        width = width
    );
    for (region, stats) in report.entries() {
        out.push_str(&format!(
            "{:<width$}  {:>12.3}  {:>12.3}  {:>10.6}  {:>8}\n",
            region,
            stats.avg_latency,
            stats.p95_latency,
            stats.avg_uptime,
            stats.breaches,
            width = width
        ));
    }
    out
}
