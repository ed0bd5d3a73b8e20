use bench_analysis::charts::ChartRenderer;
use bench_analysis::cli::{CommonArgs, init_logging};
use bench_analysis::mysql::{plot_charts, write_out_preview};
use bench_results::Category;
use bench_results::loader::load_directory;
use clap::Parser;
use log::error;
use std::io::Write;
use std::process::ExitCode;

/// Compares MySQL throughput and latency across instance types.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.common.load_config()?;
    let category = Category::Mysql;
    let mut report = load_directory(config.paths.category_dir(category), &category.extraction_spec());

    let mut out = std::io::stdout().lock();
    writeln!(out, "Loaded {} records.", report.table.len())?;
    write_out_preview(&mut report.table, &mut out)?;
    let renderer = ChartRenderer::new(&config.paths.charts_dir, &config.charts);
    plot_charts(&report.table, &renderer, &mut out)?;
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
