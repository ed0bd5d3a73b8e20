/**
 * Loading of a result directory into a `ResultTable`.
 *
 * A directory holds one file per benchmark run, either a single JSON object or
 * newline delimited JSON objects, optionally zstd compressed. Files are atomic:
 * a file that cannot be read, or that holds one malformed record, is skipped
 * as a whole and reported in the `LoadReport`. Loading never fails.
 */
use crate::category::{DocumentFormat, ExtractionSpec, FieldKind, FieldSpec};
use crate::record::{Record, ResultTable, Value};
use crate::units::{UnitError, normalize_file_size, parse_latency, parse_transfer_rate};
use log::{error, info, warn};
use serde_json::Value as Json;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EXTENSION: &str = "json";
pub const EXTENSION_ZSTD: &str = "json.zst";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line} is not a JSON object")]
    NotAnObject { line: usize },
    #[error("field {key:?}: expected {expected}, found {found}")]
    Field {
        key: String,
        expected: &'static str,
        found: String,
    },
    #[error("field {key:?}: {source}")]
    Unit {
        key: String,
        #[source]
        source: UnitError,
    },
    #[error("{0} is zstd compressed but zstd support is disabled")]
    CompressionUnsupported(PathBuf),
}

/// A file left out of the table, and why.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: LoadError,
}

impl Display for SkippedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = self
            .path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        write!(f, "{}: {}", name, self.reason)
    }
}

/// Outcome of loading one directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub table: ResultTable,
    pub skipped: Vec<SkippedFile>,
    /// Set when the directory itself could not be listed.
    pub missing_directory: bool,
    pub files_read: usize,
}

impl LoadReport {
    fn empty(spec: &ExtractionSpec) -> Self {
        LoadReport {
            table: ResultTable::new(spec.columns()),
            ..Default::default()
        }
    }
}

fn is_result_file(path: &Path) -> bool {
    path.is_file()
        && path.file_name().is_some_and(|name| {
            let name = name.to_string_lossy();
            name.ends_with(&format!(".{}", EXTENSION)) || name.ends_with(&format!(".{}", EXTENSION_ZSTD))
        })
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(feature = "zstd_support")]
fn read_zstd(path: &Path) -> Result<String, LoadError> {
    use std::io::Read;
    let file = std::fs::File::open(path).map_err(io_error(path))?;
    let mut decoder = zstd::Decoder::new(file).map_err(io_error(path))?;
    let mut contents = String::new();
    decoder
        .read_to_string(&mut contents)
        .map_err(io_error(path))?;
    Ok(contents)
}

#[cfg(not(feature = "zstd_support"))]
fn read_zstd(path: &Path) -> Result<String, LoadError> {
    Err(LoadError::CompressionUnsupported(path.to_path_buf()))
}

fn read_contents(path: &Path) -> Result<String, LoadError> {
    if path.to_string_lossy().ends_with(&format!(".{}", EXTENSION_ZSTD)) {
        read_zstd(path)
    } else {
        std::fs::read_to_string(path).map_err(io_error(path))
    }
}

fn describe(value: &Json) -> String {
    match value {
        Json::Null => "null".to_owned(),
        Json::Bool(b) => format!("boolean {}", b),
        Json::Number(n) => format!("number {}", n),
        Json::String(s) => format!("string {:?}", s),
        Json::Array(_) => "array".to_owned(),
        Json::Object(_) => "object".to_owned(),
    }
}

// Strings are used as-is, other scalars through their JSON rendering.
fn as_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn extract_field(object: &serde_json::Map<String, Json>, field: &FieldSpec) -> Result<Value, LoadError> {
    let value = object.get(&field.key);
    let mismatch = |expected: &'static str, found: &Json| LoadError::Field {
        key: field.key.clone(),
        expected,
        found: describe(found),
    };
    let unit_error = |source| LoadError::Unit {
        key: field.key.clone(),
        source,
    };

    match &field.kind {
        FieldKind::Instance => Ok(match value {
            None | Some(Json::Null) => Value::from("unknown"),
            Some(v) => Value::Text(as_text(v)),
        }),
        FieldKind::Text { default } => Ok(match value {
            None | Some(Json::Null) => Value::Text(default.clone()),
            Some(v) => Value::Text(as_text(v)),
        }),
        FieldKind::FileSize => Ok(Value::Text(
            value.map_or_else(String::new, |v| normalize_file_size(&as_text(v))),
        )),
        FieldKind::Integer => match value {
            None => Ok(Value::Int(0)),
            Some(v @ Json::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .map(Value::Int)
                .ok_or_else(|| mismatch("an integer", v)),
            Some(v @ Json::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch("an integer", v)),
            Some(v) => Err(mismatch("an integer", v)),
        },
        FieldKind::Float => match value {
            None => Ok(Value::Float(0.0)),
            Some(v @ Json::Number(n)) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| mismatch("a number", v)),
            Some(v @ Json::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| mismatch("a number", v)),
            Some(v) => Err(mismatch("a number", v)),
        },
        FieldKind::Latency => {
            let text = value.map_or_else(|| "0".to_owned(), as_text);
            parse_latency(&text).map(Value::Float).map_err(unit_error)
        }
        FieldKind::TransferRate => {
            let text = value.map_or_else(|| "0MB".to_owned(), as_text);
            Ok(Value::Float(parse_transfer_rate(&text).unwrap_or_else(|e| {
                warn!("Transfer rate {:?} of field {:?} read as 0: {}", text, field.key, e);
                0.0
            })))
        }
    }
}

fn extract_record(json: &Json, line: usize, spec: &ExtractionSpec) -> Result<Record, LoadError> {
    let object = json.as_object().ok_or(LoadError::NotAnObject { line })?;
    let mut record = Record::default();
    for field in &spec.fields {
        record.insert(field.column.clone(), extract_field(object, field)?);
    }
    Ok(record)
}

/// Parses the records held by a file's contents.
pub fn parse_records(contents: &str, spec: &ExtractionSpec) -> Result<Vec<Record>, LoadError> {
    match spec.format {
        DocumentFormat::Document => {
            let json: Json =
                serde_json::from_str(contents).map_err(|source| LoadError::Json { line: 1, source })?;
            Ok(vec![extract_record(&json, 1, spec)?])
        }
        DocumentFormat::Lines => contents
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                let line = i + 1;
                let json: Json =
                    serde_json::from_str(l).map_err(|source| LoadError::Json { line, source })?;
                extract_record(&json, line, spec)
            })
            .collect(),
    }
}

/// Reads the records of one result file.
pub fn load_file(path: impl AsRef<Path>, spec: &ExtractionSpec) -> Result<Vec<Record>, LoadError> {
    let contents = read_contents(path.as_ref())?;
    parse_records(&contents, spec)
}

/// Loads every result file of `dir` (non-recursively).
pub fn load_directory(dir: impl AsRef<Path>, spec: &ExtractionSpec) -> LoadReport {
    let dir = dir.as_ref();
    let mut report = LoadReport::empty(spec);

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Directory {} not found: {}", dir.display(), e);
            report.missing_directory = true;
            return report;
        }
    };
    info!("Reading files from {}...", dir.display());

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Failed to list an entry of {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| is_result_file(path))
        .collect();
    paths.sort();

    for path in paths {
        report.files_read += 1;
        match load_file(&path, spec) {
            Ok(records) => report.table.extend(records),
            Err(reason) => {
                let skipped = SkippedFile { path, reason };
                warn!("Skipping {}", skipped);
                report.skipped.push(skipped);
            }
        }
    }
    report
}
