use bench_analysis::charts::ChartRenderer;
use bench_analysis::cli::{CommonArgs, init_logging};
use bench_analysis::nginx::plot_charts;
use bench_results::Category;
use bench_results::loader::load_directory;
use clap::Parser;
use log::error;
use std::io::Write;
use std::process::ExitCode;

/// Compares Nginx throughput, latency and cost efficiency across instance
/// types.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.common.load_config()?;
    let category = Category::Nginx;
    let mut report = load_directory(config.paths.category_dir(category), &category.extraction_spec());

    let mut out = std::io::stdout().lock();
    writeln!(out, "Loaded {} records.", report.table.len())?;
    let renderer = ChartRenderer::new(&config.paths.charts_dir, &config.charts);
    plot_charts(
        &mut report.table,
        &config.pricing,
        &config.nginx,
        &renderer,
        &mut out,
    )?;
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
