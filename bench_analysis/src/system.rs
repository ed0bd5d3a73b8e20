/*******************************
 * CPU, memory, disk, network *
 *******************************/

//! The system benchmark report: sysbench CPU and memory, fio disk and iperf3
//! network results, one JSON record per line. Charts are written next to the
//! results.

use crate::charts::{ChartData, ChartKind, ChartRenderer, ChartSpec, Palette, RenderOutcome};
use crate::{AnalysisError, ChartOutcome, render_pivot, write_out_banner, write_out_outcome};
use bench_results::aggregate::{group_by, pivot_mean};
use bench_results::category::columns::*;
use bench_results::config::PathsConfig;
use bench_results::loader::load_directory;
use bench_results::record::format_table;
use bench_results::{Category, ResultTable, SkippedFile};
use std::io::{self, Write};

pub const CPU_CHART: &str = "cpu_performance.png";
pub const MEMORY_CHART: &str = "memory_performance.png";
pub const DISK_CHART: &str = "disk_performance.png";
pub const NETWORK_CHART: &str = "network_performance.png";

/// Results of the four system categories.
#[derive(Debug, Default)]
pub struct SystemResults {
    pub cpu: ResultTable,
    pub memory: ResultTable,
    pub disk: ResultTable,
    pub network: ResultTable,
    pub skipped: Vec<SkippedFile>,
}

impl SystemResults {
    pub fn load(paths: &PathsConfig) -> Self {
        let mut results = SystemResults::default();
        for category in Category::SYSTEM {
            let report = load_directory(paths.category_dir(category), &category.extraction_spec());
            results.skipped.extend(report.skipped);
            let table = match category {
                Category::Cpu => &mut results.cpu,
                Category::Memory => &mut results.memory,
                Category::Disk => &mut results.disk,
                _ => &mut results.network,
            };
            *table = report.table;
        }
        results
    }
}

fn bar_chart(title: &str, y_label: &str, palette: Palette) -> ChartSpec {
    ChartSpec::new(ChartKind::GroupedBar, title, palette).labels("Instance Type", y_label)
}

pub fn analyze_cpu(
    table: &ResultTable,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No CPU data available")?;
        return Ok(Vec::new());
    }
    write_out_banner(&mut out, "CPU Performance Summary (Events per Second)")?;
    match group_by(table, &[INSTANCE], EVENTS_PER_SECOND) {
        Ok(summary) => writeln!(out, "{}", summary)?,
        Err(e) => writeln!(out, "No summary: {}", e)?,
    }

    let spec = bar_chart("CPU Performance Comparison", "Events per Second", Palette::Deep).legend("Threads");
    let outcome = ChartOutcome::new(
        CPU_CHART,
        render_pivot(renderer, CPU_CHART, &spec, table, (INSTANCE, THREADS, EVENTS_PER_SECOND)),
    );
    writeln!(out)?;
    write_out_outcome(&mut out, &outcome)?;
    Ok(vec![outcome])
}

pub fn analyze_memory(
    table: &ResultTable,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No memory data available")?;
        return Ok(Vec::new());
    }
    write_out_banner(&mut out, "Memory Bandwidth Summary (MiB/sec)")?;
    let result = match pivot_mean(table, INSTANCE, OPERATION, BANDWIDTH_MIBS) {
        Ok(pivot) => {
            writeln!(out, "{}", pivot)?;
            let spec = bar_chart("Memory Bandwidth Comparison", "Bandwidth (MiB/sec)", Palette::Deep)
                .legend("Operation");
            renderer
                .render(MEMORY_CHART, &spec, &ChartData::from_pivot(&pivot))
                .map_err(AnalysisError::from)
        }
        Err(e) => Err(e.into()),
    };
    let outcome = ChartOutcome::new(MEMORY_CHART, result);
    write_out_outcome(&mut out, &outcome)?;
    Ok(vec![outcome])
}

/// Mean IOPS and bandwidth per instance and I/O type, in one table.
pub fn disk_summary(table: &ResultTable) -> Result<String, AnalysisError> {
    let iops = group_by(table, &[INSTANCE, IO_TYPE], IOPS)?;
    let bandwidth = group_by(table, &[INSTANCE, IO_TYPE], BANDWIDTH_KBS)?;
    let header: Vec<String> = [INSTANCE, IO_TYPE, IOPS, BANDWIDTH_KBS].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = iops
        .iter()
        .map(|(key, stats)| {
            let bw = bandwidth
                .get(key)
                .map_or_else(|| "NaN".to_owned(), |s| format!("{:.2}", s.mean));
            key.iter()
                .map(ToString::to_string)
                .chain([format!("{:.2}", stats.mean), bw])
                .collect()
        })
        .collect();
    Ok(format_table(&header, &rows))
}

/// IOPS and bandwidth side by side.
fn render_disk(table: &ResultTable, renderer: &ChartRenderer) -> Result<RenderOutcome, AnalysisError> {
    let iops = ChartData::from_pivot(&pivot_mean(table, INSTANCE, IO_TYPE, IOPS)?);
    let bandwidth = ChartData::from_pivot(&pivot_mean(table, INSTANCE, IO_TYPE, BANDWIDTH_KBS)?);
    let iops_spec = bar_chart("IOPS Comparison", IOPS, Palette::Deep).legend("I/O Type");
    let bandwidth_spec = bar_chart("Bandwidth Comparison", BANDWIDTH_KBS, Palette::Deep).legend("I/O Type");
    Ok(renderer.render_panels(
        DISK_CHART,
        None,
        &[(&iops_spec, &iops), (&bandwidth_spec, &bandwidth)],
    )?)
}

pub fn analyze_disk(
    table: &ResultTable,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No disk data available")?;
        return Ok(Vec::new());
    }
    write_out_banner(&mut out, "Disk I/O Performance Summary")?;
    match disk_summary(table) {
        Ok(summary) => writeln!(out, "{}", summary)?,
        Err(e) => writeln!(out, "No summary: {}", e)?,
    }

    let result = render_disk(table, renderer);
    let outcome = ChartOutcome::new(DISK_CHART, result);
    write_out_outcome(&mut out, &outcome)?;
    Ok(vec![outcome])
}

pub fn analyze_network(
    table: &ResultTable,
    renderer: &ChartRenderer,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    if table.is_empty() {
        writeln!(out, "No network data available")?;
        return Ok(Vec::new());
    }
    write_out_banner(&mut out, "Network Bandwidth Summary (Mbps)")?;
    match pivot_mean(table, INSTANCE, PARALLEL_STREAMS, BANDWIDTH_MBPS) {
        Ok(pivot) => writeln!(out, "{}", pivot)?,
        Err(e) => writeln!(out, "No summary: {}", e)?,
    }

    let spec = bar_chart("Network Bandwidth Comparison", BANDWIDTH_MBPS, Palette::Deep)
        .legend(PARALLEL_STREAMS);
    let outcome = ChartOutcome::new(
        NETWORK_CHART,
        render_pivot(renderer, NETWORK_CHART, &spec, table, (INSTANCE, PARALLEL_STREAMS, BANDWIDTH_MBPS)),
    );
    write_out_outcome(&mut out, &outcome)?;
    Ok(vec![outcome])
}

/// The full report: every system analysis under a timestamped header.
pub fn write_out_report(
    results: &SystemResults,
    renderer: &ChartRenderer,
    generated: chrono::DateTime<chrono::Local>,
    mut out: impl Write,
) -> io::Result<Vec<ChartOutcome>> {
    write_out_banner(&mut out, "CLOUD PERFORMANCE BENCHMARK - COMPREHENSIVE REPORT")?;
    writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"))?;

    let mut outcomes = analyze_cpu(&results.cpu, renderer, &mut out)?;
    outcomes.extend(analyze_memory(&results.memory, renderer, &mut out)?);
    outcomes.extend(analyze_disk(&results.disk, renderer, &mut out)?);
    outcomes.extend(analyze_network(&results.network, renderer, &mut out)?);

    write_out_banner(&mut out, "Report generation completed!")?;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_results::config::ChartsConfig;
    use bench_results::{Record, Value};

    fn disk_table() -> ResultTable {
        ResultTable::from_records(
            [
                ("t3.medium", "randread", 3000.0, 12000.0),
                ("t3.medium", "randread", 3200.0, 12800.0),
                ("t3.medium", "randwrite", 2900.0, 11600.0),
                ("c5.large", "randread", 3100.0, 12400.0),
            ]
            .into_iter()
            .map(|(instance, io, iops, bw)| {
                Record::from_iter([
                    (INSTANCE, Value::from(instance)),
                    (IO_TYPE, Value::from(io)),
                    (IOPS, Value::from(iops)),
                    (BANDWIDTH_KBS, Value::from(bw)),
                ])
            })
            .collect(),
        )
    }

    #[test]
    fn disk_summary_joins_both_means() {
        let summary = disk_summary(&disk_table()).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(IOPS) && lines[0].contains(BANDWIDTH_KBS));
        assert!(lines.iter().any(|l| l.contains("t3.medium") && l.contains("randread") && l.contains("3100.00") && l.contains("12400.00")));
        assert!(lines.iter().any(|l| l.contains("c5.large") && l.contains("3100.00")));
    }

    #[test]
    fn empty_categories_are_announced() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path(), &ChartsConfig::default());
        let mut out = Vec::new();
        let outcomes = write_out_report(
            &SystemResults::default(),
            &renderer,
            chrono::Local::now(),
            &mut out,
        )
        .unwrap();
        assert!(outcomes.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CLOUD PERFORMANCE BENCHMARK - COMPREHENSIVE REPORT"));
        assert!(text.contains("Generated: "));
        for line in [
            "No CPU data available",
            "No memory data available",
            "No disk data available",
            "No network data available",
            "Report generation completed!",
        ] {
            assert!(text.contains(line), "missing {:?}", line);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn loads_every_category() {
        let dir = tempfile::tempdir().unwrap();
        let cpu = dir.path().join("cpu");
        std::fs::create_dir(&cpu).unwrap();
        std::fs::write(
            cpu.join("run.json"),
            "{\"instance_type\": \"t3.medium\", \"threads\": 1, \"events_per_second\": 900.5}\n\
             {\"instance_type\": \"t3.medium\", \"threads\": 2, \"events_per_second\": 1750.0}\n",
        )
        .unwrap();
        std::fs::write(cpu.join("broken.json"), "{").unwrap();
        let paths = PathsConfig {
            results_dir: dir.path().to_path_buf(),
            ..PathsConfig::default()
        };
        let results = SystemResults::load(&paths);
        assert_eq!(results.cpu.len(), 2);
        assert!(results.memory.is_empty());
        assert!(results.disk.is_empty());
        assert!(results.network.is_empty());
        assert_eq!(results.skipped.len(), 1);
    }
}
