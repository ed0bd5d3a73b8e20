/**
 * Analyses of cloud benchmark results.
 *
 * Each analysis takes the `ResultTable` of one benchmark category, writes a
 * textual summary to the given output and renders its comparison charts.
 * Failures are reported per chart, so that one bad chart never prevents the
 * others from being drawn.
 */
pub mod charts;
pub mod cli;
pub mod mysql;
pub mod nginx;
pub mod system;

use bench_results::aggregate::pivot_mean;
use bench_results::{AggregateError, ResultTable};
use charts::{ChartData, ChartError, ChartRenderer, ChartSpec, RenderOutcome};
use log::error;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// What happened to one chart of an analysis.
#[derive(Debug)]
pub struct ChartOutcome {
    pub name: String,
    pub result: Result<RenderOutcome, AnalysisError>,
}

impl ChartOutcome {
    pub fn new(name: impl Into<String>, result: Result<RenderOutcome, AnalysisError>) -> Self {
        ChartOutcome {
            name: name.into(),
            result,
        }
    }

    pub fn written(&self) -> Option<&Path> {
        match &self.result {
            Ok(RenderOutcome::Written(path)) => Some(path),
            _ => None,
        }
    }
}

pub const SEPARATOR_WIDTH: usize = 60;

/// A title between two rules of `=`.
pub fn write_out_banner(mut out: impl Write, title: &str) -> std::io::Result<()> {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    writeln!(out, "\n{}", rule)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", rule)
}

pub fn write_out_outcome(mut out: impl Write, outcome: &ChartOutcome) -> std::io::Result<()> {
    match &outcome.result {
        Ok(RenderOutcome::Written(path)) => writeln!(out, "✓ Chart saved: {}", path.display()),
        Ok(RenderOutcome::Skipped(reason)) => {
            writeln!(out, "Skipping {}: {}", outcome.name, reason)
        }
        Err(e) => {
            error!("[{}] {}", outcome.name, e);
            writeln!(out, "Failed to generate {}: {}", outcome.name, e)
        }
    }
}

/// Mean of `target` with `index` on the x axis and one series per `series`
/// value.
pub(crate) fn render_pivot(
    renderer: &ChartRenderer,
    file_name: &str,
    spec: &ChartSpec,
    table: &ResultTable,
    (index, series, target): (&str, &str, &str),
) -> Result<RenderOutcome, AnalysisError> {
    let pivot = pivot_mean(table, index, series, target)?;
    Ok(renderer.render(file_name, spec, &ChartData::from_pivot(&pivot))?)
}
