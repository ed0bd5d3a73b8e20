//! Command line plumbing shared by the analysis binaries.

use bench_results::{AnalysisConfig, ConfigError};
use clap::Args;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// TOML configuration file; built-in defaults are used without it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Root of the per category result directories
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,
    /// Where charts are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// The configuration file if given, with the directory flags on top.
    pub fn load_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                AnalysisConfig::from_file(path)?
            }
            None => AnalysisConfig::default(),
        };
        if let Some(dir) = &self.results_dir {
            config.paths.results_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.charts_dir = dir.clone();
        }
        Ok(config)
    }

    /// `--output-dir` if given, `default` otherwise.
    pub fn output_dir_or(&self, default: &Path) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| default.to_path_buf())
    }
}

/// Logs at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn no_flags_is_default() {
        let cli = Cli::try_parse_from(["analyze"]).unwrap();
        assert_eq!(cli.common.load_config().unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("analysis.toml");
        std::fs::write(
            &config,
            "[paths]\nresults_dir = \"/srv/results\"\ncharts_dir = \"/srv/charts\"\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "analyze",
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            "out",
        ])
        .unwrap();
        let loaded = cli.common.load_config().unwrap();
        assert_eq!(loaded.paths.results_dir, PathBuf::from("/srv/results"));
        assert_eq!(loaded.paths.charts_dir, PathBuf::from("out"));
        assert_eq!(cli.common.output_dir_or(Path::new("results")), PathBuf::from("out"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["analyze", "--config", "/nonexistent/analysis.toml"]).unwrap();
        assert!(matches!(cli.common.load_config(), Err(ConfigError::Io { .. })));
    }
}
