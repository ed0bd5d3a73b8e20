/**
 * Group statistics over a `ResultTable`.
 *
 * Rows are grouped by the values of one or more categorical columns (integer
 * or text), and a numeric column is reduced to count, mean, sample standard
 * deviation, min and max per group. Only groups with at least one row exist.
 * Two-key summaries can be unstacked into a `PivotTable`, where absent
 * combinations are explicit `None` cells.
 */
use crate::record::{ResultTable, Value, format_table};
use core::fmt::{Display, Formatter};
use itertools::Itertools;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregateError {
    #[error("no data")]
    NoData,
    #[error("unknown column {0:?}")]
    UnknownColumn(String),
    #[error("column {0:?} is not categorical")]
    NotCategorical(String),
    #[error("column {0:?} is not numeric")]
    NotNumeric(String),
    #[error("unstacking needs exactly two group keys, found {0}")]
    NotTwoKeys(usize),
}

/// A categorical value used to identify a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl GroupKey {
    fn from_value(value: &Value, column: &str) -> Result<Self, AggregateError> {
        match value {
            Value::Int(i) => Ok(GroupKey::Int(*i)),
            Value::Text(s) => Ok(GroupKey::Text(s.clone())),
            Value::Float(_) => Err(AggregateError::NotCategorical(column.to_owned())),
        }
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            GroupKey::Int(i) => write!(f, "{}", i),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        GroupKey::Text(value.to_owned())
    }
}

impl From<i64> for GroupKey {
    fn from(value: i64) -> Self {
        GroupKey::Int(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    pub fn from_values(values: &[f64]) -> Option<Stats> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                / (count - 1) as f64;
            Some(var.sqrt())
        } else {
            None
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Stats {
            count,
            mean,
            std,
            min,
            max,
        })
    }
}

fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.2}", v),
        _ => "NaN".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSummary {
    keys: Vec<String>,
    target: String,
    groups: BTreeMap<Vec<GroupKey>, Stats>,
}

/// Groups `table` by the `keys` columns and reduces `target` in each group.
pub fn group_by(
    table: &ResultTable,
    keys: &[&str],
    target: &str,
) -> Result<AggregateSummary, AggregateError> {
    if table.is_empty() {
        return Err(AggregateError::NoData);
    }
    for column in keys.iter().chain(core::iter::once(&target)) {
        if !table.has_column(column) {
            return Err(AggregateError::UnknownColumn((*column).to_owned()));
        }
    }

    let mut values: BTreeMap<Vec<GroupKey>, Vec<f64>> = BTreeMap::new();
    for record in table.records() {
        // Rows missing a key or the target do not belong to any group.
        let Some(key) = keys
            .iter()
            .map(|k| record.get(k).map(|v| GroupKey::from_value(v, k)))
            .collect::<Option<Result<Vec<_>, _>>>()
        else {
            continue;
        };
        let key = key?;
        let Some(value) = record.get(target) else {
            continue;
        };
        let value = value
            .as_f64()
            .ok_or_else(|| AggregateError::NotNumeric(target.to_owned()))?;
        values.entry(key).or_default().push(value);
    }

    let groups = values
        .into_iter()
        .filter_map(|(k, v)| Stats::from_values(&v).map(|s| (k, s)))
        .collect();
    Ok(AggregateSummary {
        keys: keys.iter().map(|k| (*k).to_owned()).collect(),
        target: target.to_owned(),
        groups,
    })
}

/// Mean of `target` for each (`index`, `columns`) pair, unstacked.
pub fn pivot_mean(
    table: &ResultTable,
    index: &str,
    columns: &str,
    target: &str,
) -> Result<PivotTable, AggregateError> {
    group_by(table, &[index, columns], target)?.unstack()
}

impl AggregateSummary {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &[GroupKey]) -> Option<&Stats> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<GroupKey>, &Stats)> {
        self.groups.iter()
    }

    pub fn means(&self) -> BTreeMap<Vec<GroupKey>, f64> {
        self.groups.iter().map(|(k, s)| (k.clone(), s.mean)).collect()
    }

    /// Moves the second key into columns.
    pub fn unstack(&self) -> Result<PivotTable, AggregateError> {
        if self.keys.len() != 2 {
            return Err(AggregateError::NotTwoKeys(self.keys.len()));
        }
        let rows: Vec<GroupKey> = self.groups.keys().map(|k| k[0].clone()).unique().collect();
        let columns: Vec<GroupKey> = self
            .groups
            .keys()
            .map(|k| k[1].clone())
            .sorted()
            .dedup()
            .collect();
        let cells = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| {
                        self.groups
                            .get(&vec![r.clone(), c.clone()])
                            .map(|s| s.mean)
                    })
                    .collect()
            })
            .collect();
        Ok(PivotTable {
            index_name: self.keys[0].clone(),
            columns_name: self.keys[1].clone(),
            value_name: self.target.clone(),
            rows,
            columns,
            cells,
        })
    }
}

impl Display for AggregateSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let header: Vec<String> = self
            .keys
            .iter()
            .cloned()
            .chain(["mean", "std", "min", "max"].map(String::from))
            .collect();
        let rows: Vec<Vec<String>> = self
            .groups
            .iter()
            .map(|(k, s)| {
                k.iter()
                    .map(ToString::to_string)
                    .chain([
                        fmt_cell(Some(s.mean)),
                        fmt_cell(s.std),
                        fmt_cell(Some(s.min)),
                        fmt_cell(Some(s.max)),
                    ])
                    .collect()
            })
            .collect();
        write!(f, "{}", format_table(&header, &rows))
    }
}

/// A two-key mean table: first key as rows, second key as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index_name: String,
    pub columns_name: String,
    pub value_name: String,
    pub rows: Vec<GroupKey>,
    pub columns: Vec<GroupKey>,
    /// `cells[row][column]`, `None` where no row had that combination.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, row: &GroupKey, column: &GroupKey) -> Option<f64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        self.cells[r][c]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

impl Display for PivotTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let header: Vec<String> = core::iter::once(format!("{} \\ {}", self.index_name, self.columns_name))
            .chain(self.columns.iter().map(ToString::to_string))
            .collect();
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .zip(&self.cells)
            .map(|(k, cells)| {
                core::iter::once(k.to_string())
                    .chain(cells.iter().map(|c| fmt_cell(*c)))
                    .collect()
            })
            .collect();
        write!(f, "{}", format_table(&header, &rows))
    }
}
