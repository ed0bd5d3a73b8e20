use clap::Parser;
use env_logger::Env;
use instance_recommender::report::{REPORT_FILE, write_out_summary, write_report_file};
use instance_recommender::{SCENARIOS, train};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Recommends instance types for a few reference workloads.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Where the report is written
    #[arg(long, value_name = "FILE", default_value_os_t = PathBuf::from("analysis_charts").join(REPORT_FILE))]
    output: PathBuf,
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("Cloud Instance Recommender System");
    println!("Based on benchmarks: Sysbench, FIO, iperf3, MySQL, Nginx");
    println!("{}", rule);

    let model = train()?;
    println!("✓ Model trained successfully on benchmark knowledge base.\n");

    write_out_summary(&model, &SCENARIOS, std::io::stdout().lock())?;
    write_report_file(&model, &SCENARIOS, &cli.output)?;
    println!("\n✓ Report generated at: {}", cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
