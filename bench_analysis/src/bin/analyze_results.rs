use bench_analysis::charts::ChartRenderer;
use bench_analysis::cli::{CommonArgs, init_logging};
use bench_analysis::system::{SystemResults, write_out_report};
use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

/// Summarizes the CPU, memory, disk and network benchmarks.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let config = match cli.common.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let results = SystemResults::load(&config.paths);
    if !results.skipped.is_empty() {
        info!("{} result files skipped", results.skipped.len());
    }
    // Charts live next to the results unless told otherwise.
    let renderer = ChartRenderer::new(
        cli.common.output_dir_or(&config.paths.results_dir),
        &config.charts,
    );
    match write_out_report(&results, &renderer, chrono::Local::now(), std::io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to write the report: {}", e);
            ExitCode::FAILURE
        }
    }
}
