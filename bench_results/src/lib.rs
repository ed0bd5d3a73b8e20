/**
Benchmark results for cloud instances: unit normalization, loading of result
directories into tables, and the group statistics used by the analyses.

This crate is used to factorize the ingestion code so that every analysis
(and its tests) goes through the same loader and aggregator.
*/
pub mod aggregate;
pub mod category;
pub mod config;
pub mod loader;
pub mod record;
pub mod units;

pub use aggregate::{AggregateError, AggregateSummary, GroupKey, PivotTable, Stats};
pub use category::{Category, DocumentFormat, ExtractionSpec, FieldKind, FieldSpec};
pub use config::{AnalysisConfig, ConfigError};
pub use loader::{LoadError, LoadReport, SkippedFile};
pub use record::{Record, ResultTable, Value};
pub use units::UnitError;
