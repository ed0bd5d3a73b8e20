//! Configuration of the analyses.
//!
//! Every section has defaults reproducing the layout the benchmark scripts
//! write (`results/<category>/`, charts in `analysis_charts/`), so a missing
//! or partial TOML file is valid.
//!
//! ```toml
//! [paths]
//! results_dir = "results"
//! charts_dir = "analysis_charts"
//!
//! [pricing.prices_per_hour]
//! "t3.medium" = 0.0416
//! ```

use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub nginx: NginxConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding one subdirectory per benchmark category.
    pub results_dir: PathBuf,
    /// Where the MySQL and Nginx charts are written.
    pub charts_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            results_dir: PathBuf::from("results"),
            charts_dir: PathBuf::from("analysis_charts"),
        }
    }
}

impl PathsConfig {
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.results_dir.join(category.dir_name())
    }
}

/// Pixel size of a single chart panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        ChartsConfig {
            width: 1000,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// On-demand price in $/hour, by instance type.
    pub prices_per_hour: BTreeMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            prices_per_hour: [("t3.medium", 0.0416), ("m5.large", 0.0960), ("c5.large", 0.0850)]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        }
    }
}

impl PricingConfig {
    pub fn price(&self, instance: &str) -> Option<f64> {
        self.prices_per_hour.get(instance).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Facet order of the per file size charts.
    pub file_sizes: Vec<String>,
    /// Subset used for the cost efficiency chart.
    pub cost_efficiency_file_size: String,
    pub cost_efficiency_concurrency: i64,
}

impl Default for NginxConfig {
    fn default() -> Self {
        NginxConfig {
            file_sizes: ["1kb.html", "10kb.html", "100kb.html"]
                .map(String::from)
                .to_vec(),
            cost_efficiency_file_size: "1kb.html".to_owned(),
            cost_efficiency_concurrency: 1000,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&contents)
    }

    pub fn parse_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.charts.width == 0 || self.charts.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "charts size must be non zero (got {}x{})",
                self.charts.width, self.charts.height
            )));
        }
        if let Some((instance, price)) = self
            .pricing
            .prices_per_hour
            .iter()
            .find(|(_, p)| !(p.is_finite() && **p > 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "price of {} must be a positive number (got {})",
                instance, price
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_script_layout() {
        let config = AnalysisConfig::default();
        assert_eq!(config.paths.category_dir(Category::Mysql), PathBuf::from("results/mysql"));
        assert_eq!(config.paths.charts_dir, PathBuf::from("analysis_charts"));
        assert_eq!(config.pricing.price("t3.medium"), Some(0.0416));
        assert_eq!(config.pricing.price("m5.large"), Some(0.0960));
        assert_eq!(config.pricing.price("c5.large"), Some(0.0850));
        assert_eq!(config.pricing.price("x1.32xlarge"), None);
        assert_eq!(config.nginx.cost_efficiency_concurrency, 1000);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AnalysisConfig::parse_toml("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = AnalysisConfig::parse_toml(
            r#"
            [paths]
            results_dir = "/data/bench"

            [pricing.prices_per_hour]
            "c6g.large" = 0.068
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.results_dir, PathBuf::from("/data/bench"));
        assert_eq!(config.paths.charts_dir, PathBuf::from("analysis_charts"));
        assert_eq!(config.pricing.price("c6g.large"), Some(0.068));
        assert_eq!(config.pricing.price("t3.medium"), None);
    }

    #[test]
    fn round_trip() {
        let config = AnalysisConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AnalysisConfig::parse_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AnalysisConfig::parse_toml("[charts]\nwidth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AnalysisConfig::parse_toml("[pricing.prices_per_hour]\n\"a\" = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AnalysisConfig::parse_toml("[paths]\nresults_dir = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
