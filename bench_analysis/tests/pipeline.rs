use bench_analysis::charts::{ChartRenderer, RenderOutcome};
use bench_analysis::mysql::{self, write_out_preview};
use bench_analysis::nginx::{self, add_cost_columns, cost_efficiency_subset, facets};
use bench_results::category::columns::*;
use bench_results::loader::load_directory;
use bench_results::{AnalysisConfig, Category};
use std::fs;
use std::path::{Path, PathBuf};

#[test]
fn mysql_directory_to_preview() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("m5_16.json"),
        r#"{"instance_type": "m5.large", "threads": 16, "tps": 812.4, "qps": 16248.0, "latency_avg_ms": 19.7, "latency_95th_ms": 31.2}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("t3_1.json"),
        r#"{"instance_type": "t3.medium", "threads": "1", "tps": 120.5}"#,
    )
    .unwrap();
    fs::write(dir.path().join("truncated.json"), r#"{"instance_type": "#).unwrap();

    let mut report = load_directory(dir.path(), &Category::Mysql.extraction_spec());
    assert_eq!(report.table.len(), 2);
    assert_eq!(report.skipped.len(), 1);

    let mut out = Vec::new();
    write_out_preview(&mut report.table, &mut out).unwrap();
    let first = &report.table.records()[0];
    assert_eq!(first.get_str(INSTANCE), Some("t3.medium"));
    assert_eq!(first.get_f64(QPS), Some(0.0));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("m5.large"));
}

#[test]
fn nginx_directory_to_cost_subset() {
    let dir = tempfile::tempdir().unwrap();
    let runs = [
        ("t3.medium", 1000, "9800.5", "250us", "2.01GB"),
        ("c5.large", 1000, "15000", "1.2ms", "300MB"),
        ("c5.large", 100, "14000", "0.5ms", "bogus"),
    ];
    for (i, (instance, connections, rps, latency, transfer)) in runs.iter().enumerate() {
        fs::write(
            dir.path().join(format!("run_{}.json", i)),
            format!(
                r#"{{"instance_type": "{}", "target_file": "static/1kb.html", "connections": {}, "requests_per_sec": "{}", "latency_avg": "{}", "transfer_per_sec": "{}"}}"#,
                instance, connections, rps, latency, transfer
            ),
        )
        .unwrap();
    }

    let config = AnalysisConfig::default();
    let mut report = load_directory(dir.path(), &Category::Nginx.extraction_spec());
    assert!(report.skipped.is_empty());
    assert_eq!(report.table.len(), 3);
    let t3 = &report.table.records()[0];
    assert_eq!(t3.get_str(FILE_SIZE), Some("1kb.html"));
    assert_eq!(t3.get_f64(LATENCY_MS), Some(0.25));
    assert_eq!(t3.get_f64(TRANSFER_MBS), Some(2058.24));
    assert_eq!(report.table.records()[2].get_f64(TRANSFER_MBS), Some(0.0));

    add_cost_columns(&mut report.table, &config.pricing);
    let subset = cost_efficiency_subset(&report.table, &config.nginx);
    assert_eq!(subset.len(), 2);
    let c5 = subset
        .records()
        .iter()
        .find(|r| r.get_str(INSTANCE) == Some("c5.large"))
        .unwrap();
    let expected = 15000.0 * 3600.0 / 0.0850;
    assert!((c5.get_f64(REQUESTS_PER_DOLLAR).unwrap() - expected).abs() < 1e-6);

    let panels = facets(&report.table, &config.nginx.file_sizes, RPS).unwrap();
    assert_eq!(panels.len(), 3);
    assert_eq!(panels[0].1.categories, vec!["100", "1000"]);
    assert!(panels[1].1.is_degenerate() && panels[2].1.is_degenerate());
}

#[test]
fn missing_directory_renders_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let report = load_directory(dir.path().join("nginx"), &Category::Nginx.extraction_spec());
    assert!(report.missing_directory);
    let renderer = ChartRenderer::new(dir.path().join("charts"), &AnalysisConfig::default().charts);
    let panels = facets(&report.table, &AnalysisConfig::default().nginx.file_sizes, RPS).unwrap();
    let spec = bench_analysis::charts::ChartSpec::new(
        bench_analysis::charts::ChartKind::GroupedBar,
        "RPS",
        bench_analysis::charts::Palette::Viridis,
    );
    let refs: Vec<_> = panels.iter().map(|(_, data)| (&spec, data)).collect();
    let outcome = renderer.render_panels("rps.png", None, &refs).unwrap();
    assert!(matches!(outcome, RenderOutcome::Skipped(_)));
    assert!(!dir.path().join("charts").exists());
}

#[test]
fn nginx_directory_to_charts() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("nginx");
    fs::create_dir(&results).unwrap();
    let runs = [
        ("t3.medium", "1kb.html", 1000, "9800.5", "250us"),
        ("c5.large", "1kb.html", 1000, "15000", "1.2ms"),
        ("c5.large", "10kb.html", 100, "14000", "0.5ms"),
    ];
    for (i, (instance, file, connections, rps, latency)) in runs.iter().enumerate() {
        fs::write(
            results.join(format!("run_{}.json", i)),
            format!(
                r#"{{"instance_type": "{}", "target_file": "static/{}", "connections": {}, "requests_per_sec": "{}", "latency_avg": "{}", "transfer_per_sec": "1MB"}}"#,
                instance, file, connections, rps, latency
            ),
        )
        .unwrap();
    }

    let config = AnalysisConfig::default();
    let mut report = load_directory(&results, &Category::Nginx.extraction_spec());
    let renderer = ChartRenderer::new(dir.path().join("charts"), &config.charts);
    let mut out = Vec::new();
    let outcomes =
        nginx::plot_charts(&mut report.table, &config.pricing, &config.nginx, &renderer, &mut out)
            .unwrap();
    assert_eq!(outcomes.len(), 3);
    for (outcome, file) in outcomes
        .iter()
        .zip([nginx::RPS_CHART, nginx::LATENCY_CHART, nginx::COST_CHART])
    {
        let path = outcome.written().unwrap();
        assert_eq!(path.to_path_buf(), renderer.output_dir().join(file));
        assert!(path.exists());
    }
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Chart saved"));
    assert!(!text.contains("Failed"));
}

#[test]
fn mysql_directory_to_charts() {
    let dir = tempfile::tempdir().unwrap();
    for (instance, threads, tps, latency) in
        [("m5.large", 1, 210.0, 4.7), ("m5.large", 16, 812.4, 19.7), ("t3.medium", 16, 402.1, 39.8)]
    {
        fs::write(
            dir.path().join(format!("{}_{}.json", instance, threads)),
            format!(
                r#"{{"instance_type": "{}", "threads": {}, "tps": {}, "qps": {}, "latency_avg_ms": {}}}"#,
                instance,
                threads,
                tps,
                tps * 20.0,
                latency
            ),
        )
        .unwrap();
    }

    let report = load_directory(dir.path(), &Category::Mysql.extraction_spec());
    assert_eq!(report.table.len(), 3);
    let renderer = ChartRenderer::new(dir.path().join("charts"), &AnalysisConfig::default().charts);
    let outcomes = mysql::plot_charts(&report.table, &renderer, std::io::sink()).unwrap();
    let written: Vec<PathBuf> = outcomes
        .iter()
        .filter_map(|o| o.written())
        .map(Path::to_path_buf)
        .collect();
    let expected: Vec<PathBuf> = [mysql::TPS_CHART, mysql::QPS_CHART, mysql::LATENCY_CHART]
        .iter()
        .map(|f| renderer.output_dir().join(f))
        .collect();
    assert_eq!(written, expected);
    assert!(written.iter().all(|p| p.exists()));
}
