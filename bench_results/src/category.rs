use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Column names shared by the analyses.
pub mod columns {
    pub const INSTANCE: &str = "Instance";
    pub const THREADS: &str = "Threads";
    pub const EVENTS_PER_SECOND: &str = "Events/sec";
    pub const OPERATION: &str = "Operation";
    pub const BANDWIDTH_MIBS: &str = "Bandwidth (MiB/sec)";
    pub const IO_TYPE: &str = "I/O Type";
    pub const IOPS: &str = "IOPS";
    pub const BANDWIDTH_KBS: &str = "Bandwidth (KB/s)";
    pub const PARALLEL_STREAMS: &str = "Parallel Streams";
    pub const BANDWIDTH_MBPS: &str = "Bandwidth (Mbps)";
    pub const TPS: &str = "TPS";
    pub const QPS: &str = "QPS";
    pub const LATENCY_AVG_MS: &str = "Latency Avg (ms)";
    pub const LATENCY_95TH_MS: &str = "Latency 95th (ms)";
    pub const FILE_SIZE: &str = "File Size";
    pub const CONCURRENCY: &str = "Concurrency";
    pub const RPS: &str = "RPS";
    pub const LATENCY_MS: &str = "Latency (ms)";
    pub const TRANSFER_MBS: &str = "Transfer (MB/s)";
    pub const PRICE_PER_HOUR: &str = "Price ($/hr)";
    pub const REQUESTS_PER_DOLLAR: &str = "Requests Per Dollar";
}

/// Layout of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// One JSON object per file.
    Document,
    /// One JSON object per non-empty line.
    Lines,
}

/// How a JSON value is coerced into a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Instance type, `"unknown"` when missing or null.
    Instance,
    /// Free text with a default for missing values.
    Text { default: String },
    /// wrk target file, with its `static/` prefix removed.
    FileSize,
    /// Integer, 0 when missing. Floats are truncated, numeric strings parsed.
    Integer,
    /// Float, 0.0 when missing. Numeric strings are parsed.
    Float,
    /// Latency with an optional unit suffix, normalized to ms.
    Latency,
    /// Transfer rate with an optional unit suffix, normalized to MB/s.
    /// Unparsable values fall back to 0.0.
    TransferRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub column: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, column: impl Into<String>, kind: FieldKind) -> Self {
        FieldSpec {
            key: key.into(),
            column: column.into(),
            kind,
        }
    }
}

/// Which JSON keys become which columns, for one category of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSpec {
    pub format: DocumentFormat,
    pub fields: Vec<FieldSpec>,
}

impl ExtractionSpec {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.column.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cpu,
    Memory,
    Disk,
    Network,
    Mysql,
    Nginx,
}

impl Category {
    pub const SYSTEM: [Category; 4] = [
        Category::Cpu,
        Category::Memory,
        Category::Disk,
        Category::Network,
    ];

    /// Subdirectory of the results directory holding this category.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Memory => "memory",
            Category::Disk => "disk",
            Category::Network => "network",
            Category::Mysql => "mysql",
            Category::Nginx => "nginx",
        }
    }

    pub fn extraction_spec(self) -> ExtractionSpec {
        use columns::*;
        let instance = FieldSpec::new("instance_type", INSTANCE, FieldKind::Instance);
        let (format, fields) = match self {
            Category::Cpu => (
                DocumentFormat::Lines,
                vec![
                    instance,
                    FieldSpec::new("threads", THREADS, FieldKind::Integer),
                    FieldSpec::new("events_per_second", EVENTS_PER_SECOND, FieldKind::Float),
                ],
            ),
            Category::Memory => (
                DocumentFormat::Lines,
                vec![
                    instance,
                    FieldSpec::new(
                        "operation",
                        OPERATION,
                        FieldKind::Text {
                            default: "unknown".to_owned(),
                        },
                    ),
                    FieldSpec::new("bandwidth_mibs", BANDWIDTH_MIBS, FieldKind::Float),
                ],
            ),
            Category::Disk => (
                DocumentFormat::Lines,
                vec![
                    instance,
                    FieldSpec::new(
                        "io_type",
                        IO_TYPE,
                        FieldKind::Text {
                            default: "unknown".to_owned(),
                        },
                    ),
                    FieldSpec::new("iops", IOPS, FieldKind::Float),
                    FieldSpec::new("bandwidth_kbs", BANDWIDTH_KBS, FieldKind::Float),
                ],
            ),
            Category::Network => (
                DocumentFormat::Lines,
                vec![
                    instance,
                    FieldSpec::new("parallel_streams", PARALLEL_STREAMS, FieldKind::Integer),
                    FieldSpec::new("bandwidth_mbps", BANDWIDTH_MBPS, FieldKind::Float),
                ],
            ),
            Category::Mysql => (
                DocumentFormat::Document,
                vec![
                    instance,
                    FieldSpec::new("threads", THREADS, FieldKind::Integer),
                    FieldSpec::new("tps", TPS, FieldKind::Float),
                    FieldSpec::new("qps", QPS, FieldKind::Float),
                    FieldSpec::new("latency_avg_ms", LATENCY_AVG_MS, FieldKind::Float),
                    FieldSpec::new("latency_95th_ms", LATENCY_95TH_MS, FieldKind::Float),
                ],
            ),
            Category::Nginx => (
                DocumentFormat::Document,
                vec![
                    instance,
                    FieldSpec::new("target_file", FILE_SIZE, FieldKind::FileSize),
                    FieldSpec::new("connections", CONCURRENCY, FieldKind::Integer),
                    FieldSpec::new("requests_per_sec", RPS, FieldKind::Float),
                    FieldSpec::new("latency_avg", LATENCY_MS, FieldKind::Latency),
                    FieldSpec::new("transfer_per_sec", TRANSFER_MBS, FieldKind::TransferRate),
                ],
            ),
        };
        ExtractionSpec { format, fields }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
