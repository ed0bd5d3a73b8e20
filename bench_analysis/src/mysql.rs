//! Sysbench OLTP results against MySQL, one JSON document per run.

use crate::charts::{ChartKind, ChartRenderer, ChartSpec, Palette};
use crate::{ChartOutcome, render_pivot, write_out_outcome};
use bench_results::category::columns::*;
use bench_results::ResultTable;
use std::io::{self, Write};

pub const TPS_CHART: &str = "mysql_tps_comparison.png";
pub const QPS_CHART: &str = "mysql_qps_comparison.png";
pub const LATENCY_CHART: &str = "mysql_latency_comparison.png";

/// Rows shown in the preview.
pub const PREVIEW_ROWS: usize = 5;

/// Orders runs by thread count and prints the first of them.
pub fn write_out_preview(table: &mut ResultTable, mut out: impl Write) -> io::Result<()> {
    table.sort_by_column(THREADS);
    writeln!(out, "{}", table.head(PREVIEW_ROWS))
}

pub fn plot_charts(
    table: &ResultTable,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No data to plot.")?;
        return Ok(Vec::new());
    }

    let charts = [
        (
            "MySQL TPS Chart",
            TPS_CHART,
            TPS,
            ChartSpec::new(
                ChartKind::GroupedBar,
                "MySQL Performance: Transactions Per Second (TPS)",
                Palette::Viridis,
            )
            .labels("Number of Threads", "TPS (Higher is Better)"),
        ),
        (
            "MySQL QPS Chart",
            QPS_CHART,
            QPS,
            ChartSpec::new(
                ChartKind::GroupedBar,
                "MySQL Performance: Queries Per Second (QPS)",
                Palette::Magma,
            )
            .labels("Number of Threads", "QPS (Higher is Better)"),
        ),
        (
            "MySQL Latency Chart",
            LATENCY_CHART,
            LATENCY_AVG_MS,
            ChartSpec::new(
                ChartKind::LineWithMarkers,
                "MySQL Latency: Average Response Time",
                Palette::Deep,
            )
            .labels("Number of Threads", "Latency (ms) - Lower is Better"),
        ),
    ];

    let mut outcomes = Vec::with_capacity(charts.len());
    for (name, file_name, target, spec) in charts {
        writeln!(out, "Generating {}...", name)?;
        let spec = spec.legend(INSTANCE);
        let outcome = ChartOutcome::new(
            file_name,
            render_pivot(renderer, file_name, &spec, table, (THREADS, INSTANCE, target)),
        );
        write_out_outcome(&mut out, &outcome)?;
        outcomes.push(outcome);
    }
    writeln!(
        out,
        "✓ All MySQL charts saved to local folder: {}/",
        renderer.output_dir().display()
    )?;
    Ok(outcomes)
}
