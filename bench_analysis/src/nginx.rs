/**
 * wrk results against Nginx serving static files.
 *
 * Runs are faceted by served file size, in the configured order, with the
 * concurrency on the x axis and one series per instance type. The cost
 * efficiency chart divides throughput by the hourly price of the instance.
 */
use crate::charts::{ChartData, ChartKind, ChartRenderer, ChartSpec, Palette, RenderOutcome};
use crate::{AnalysisError, ChartOutcome, write_out_outcome};
use bench_results::aggregate::{group_by, pivot_mean};
use bench_results::category::columns::*;
use bench_results::config::{NginxConfig, PricingConfig};
use bench_results::{ResultTable, Value};
use log::debug;
use std::io::{self, Write};

pub const RPS_CHART: &str = "nginx_rps_comparison.png";
pub const LATENCY_CHART: &str = "nginx_latency_comparison.png";
pub const COST_CHART: &str = "nginx_cost_efficiency.png";

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Adds the hourly price and the requests served per dollar. Instances
/// without a known price get neither.
pub fn add_cost_columns(table: &mut ResultTable, pricing: &PricingConfig) {
    table.add_derived_column(PRICE_PER_HOUR, |r| {
        r.get_str(INSTANCE)
            .and_then(|i| pricing.price(i))
            .map(Value::Float)
    });
    table.add_derived_column(REQUESTS_PER_DOLLAR, |r| {
        let price = r.get_f64(PRICE_PER_HOUR)?;
        let rps = r.get_f64(RPS)?;
        Some(Value::Float(rps * SECONDS_PER_HOUR / price))
    });
}

/// Runs at the configured file size and concurrency.
pub fn cost_efficiency_subset(table: &ResultTable, nginx: &NginxConfig) -> ResultTable {
    table.filter(|r| {
        r.get_str(FILE_SIZE) == Some(nginx.cost_efficiency_file_size.as_str())
            && r.get(CONCURRENCY).and_then(Value::as_i64) == Some(nginx.cost_efficiency_concurrency)
    })
}

/// One panel per file size, in `file_sizes` order. A file size without any
/// run gives an empty panel.
pub fn facets(
    table: &ResultTable,
    file_sizes: &[String],
    target: &str,
) -> Result<Vec<(String, ChartData)>, AnalysisError> {
    file_sizes
        .iter()
        .map(|size| -> Result<(String, ChartData), AnalysisError> {
            let subset = table.filter(|r| r.get_str(FILE_SIZE) == Some(size.as_str()));
            let data = if subset.is_empty() {
                debug!("No {} run", size);
                ChartData::default()
            } else {
                ChartData::from_pivot(&pivot_mean(&subset, CONCURRENCY, INSTANCE, target)?)
            };
            Ok((format!("{} = {}", FILE_SIZE, size), data))
        })
        .collect()
}

fn render_facets(
    renderer: &ChartRenderer,
    file_name: &str,
    title: &str,
    template: &ChartSpec,
    table: &ResultTable,
    nginx: &NginxConfig,
    target: &str,
) -> Result<RenderOutcome, AnalysisError> {
    let facets = facets(table, &nginx.file_sizes, target)?;
    let specs: Vec<ChartSpec> = facets
        .iter()
        .map(|(facet, _)| ChartSpec {
            title: facet.clone(),
            ..template.clone()
        })
        .collect();
    let panels: Vec<(&ChartSpec, &ChartData)> =
        specs.iter().zip(facets.iter().map(|(_, data)| data)).collect();
    Ok(renderer.render_panels(file_name, Some(title), &panels)?)
}

fn render_cost_efficiency(
    renderer: &ChartRenderer,
    subset: &ResultTable,
    nginx: &NginxConfig,
) -> Result<RenderOutcome, AnalysisError> {
    let summary = group_by(subset, &[INSTANCE], REQUESTS_PER_DOLLAR)?;
    let spec = ChartSpec::new(
        ChartKind::Bar,
        format!(
            "Cost Efficiency: Requests Served per Dollar ({}, {} Conn)",
            nginx.cost_efficiency_file_size, nginx.cost_efficiency_concurrency
        ),
        Palette::Blues,
    )
    .labels(INSTANCE, "Requests / $1");
    Ok(renderer.render(COST_CHART, &spec, &ChartData::from_summary(&summary))?)
}

/// Draws the three Nginx charts. `table` gains the cost columns.
pub fn plot_charts(
    table: &mut ResultTable,
    pricing: &PricingConfig,
    nginx: &NginxConfig,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No data to plot.")?;
        return Ok(Vec::new());
    }
    let mut outcomes = Vec::with_capacity(3);

    writeln!(out, "Generating RPS Chart...")?;
    let rps = ChartSpec::new(ChartKind::GroupedBar, "", Palette::Viridis)
        .labels(CONCURRENCY, RPS)
        .legend(INSTANCE);
    outcomes.push(ChartOutcome::new(
        RPS_CHART,
        render_facets(
            renderer,
            RPS_CHART,
            "Nginx Throughput (Requests/Sec) Comparison",
            &rps,
            table,
            nginx,
            RPS,
        ),
    ));

    writeln!(out, "Generating Latency Chart...")?;
    let latency = ChartSpec::new(ChartKind::Points, "", Palette::Magma)
        .labels(CONCURRENCY, LATENCY_MS)
        .legend(INSTANCE);
    outcomes.push(ChartOutcome::new(
        LATENCY_CHART,
        render_facets(
            renderer,
            LATENCY_CHART,
            "Nginx Average Latency Comparison",
            &latency,
            table,
            nginx,
            LATENCY_MS,
        ),
    ));

    writeln!(out, "Generating Cost Efficiency Chart...")?;
    add_cost_columns(table, pricing);
    let subset = cost_efficiency_subset(table, nginx);
    let cost = if subset.is_empty() {
        Ok(RenderOutcome::Skipped(format!(
            "No data for {} at {} concurrency",
            nginx.cost_efficiency_file_size, nginx.cost_efficiency_concurrency
        )))
    } else {
        render_cost_efficiency(renderer, &subset, nginx)
    };
    outcomes.push(ChartOutcome::new("Cost Efficiency Chart", cost));

    for outcome in &outcomes {
        write_out_outcome(&mut out, outcome)?;
    }
    writeln!(
        out,
        "✓ All charts saved to local folder: {}/",
        renderer.output_dir().display()
    )?;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_results::config::ChartsConfig;
    use bench_results::Record;

    fn run(instance: &str, file: &str, connections: i64, rps: f64) -> Record {
        Record::from_iter([
            (INSTANCE, Value::from(instance)),
            (FILE_SIZE, Value::from(file)),
            (CONCURRENCY, Value::from(connections)),
            (RPS, Value::from(rps)),
            (LATENCY_MS, Value::from(1.5)),
        ])
    }

    #[test]
    fn requests_per_dollar() {
        let mut table = ResultTable::from_records(vec![
            run("t3.medium", "1kb.html", 1000, 41.6),
            run("x1.large", "1kb.html", 1000, 100.0),
        ]);
        add_cost_columns(&mut table, &PricingConfig::default());
        let priced = &table.records()[0];
        assert_eq!(priced.get_f64(PRICE_PER_HOUR), Some(0.0416));
        let per_dollar = priced.get_f64(REQUESTS_PER_DOLLAR).unwrap();
        assert!((per_dollar - 3_600_000.0).abs() < 1e-6);
        let unpriced = &table.records()[1];
        assert_eq!(unpriced.get(PRICE_PER_HOUR), None);
        assert_eq!(unpriced.get(REQUESTS_PER_DOLLAR), None);
        assert!(table.has_column(REQUESTS_PER_DOLLAR));
    }

    #[test]
    fn subset_matches_size_and_concurrency() {
        let table = ResultTable::from_records(vec![
            run("t3.medium", "1kb.html", 1000, 1.0),
            run("t3.medium", "1kb.html", 100, 2.0),
            run("t3.medium", "10kb.html", 1000, 3.0),
        ]);
        let subset = cost_efficiency_subset(&table, &NginxConfig::default());
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.records()[0].get_f64(RPS), Some(1.0));
    }

    #[test]
    fn facets_follow_configured_order() {
        let table = ResultTable::from_records(vec![
            run("m5.large", "100kb.html", 100, 10.0),
            run("c5.large", "1kb.html", 100, 30.0),
            run("c5.large", "1kb.html", 1000, 20.0),
            run("m5.large", "5kb.html", 100, 50.0),
        ]);
        let facets = facets(&table, &NginxConfig::default().file_sizes, RPS).unwrap();
        let names: Vec<&str> = facets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "File Size = 1kb.html",
                "File Size = 10kb.html",
                "File Size = 100kb.html"
            ]
        );
        assert_eq!(facets[0].1.categories, vec!["100", "1000"]);
        assert_eq!(facets[0].1.series[0].name, "c5.large");
        assert!(facets[1].1.is_degenerate());
        assert_eq!(facets[2].1.series[0].values, vec![Some(10.0)]);
    }

    #[test]
    fn cost_chart_skipped_without_subset() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path().join("charts"), &ChartsConfig::default());
        // Only a file size outside the facets: every panel is empty.
        let mut table = ResultTable::from_records(vec![run("t3.medium", "5kb.html", 10, 1.0)]);
        let mut out = Vec::new();
        let outcomes = plot_charts(
            &mut table,
            &PricingConfig::default(),
            &NginxConfig::default(),
            &renderer,
            &mut out,
        )
        .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| matches!(o.result, Ok(RenderOutcome::Skipped(_)))));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(
            "Skipping Cost Efficiency Chart: No data for 1kb.html at 1000 concurrency"
        ));
        assert!(!dir.path().join("charts").exists());
    }
}
