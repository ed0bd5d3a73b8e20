use core::cmp::Ordering;
use core::fmt::{Display, Formatter};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

/// A scalar cell of a result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used for sorting rows: numbers before text, NaN last among
    /// numbers.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (a, b) => {
                // Both numeric at this point.
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => a.total_cmp(&b),
                }
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:.2}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/**
One benchmark run, as a flat mapping from column name to value.

Records are only built by the loader (or by tests through `FromIterator`), and
only modified by adding derived columns on their table.
*/
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The records of one benchmark category, in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl ResultTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        ResultTable {
            columns: columns.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Builds a table from records, the columns being the union of their
    /// fields in first-seen order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let columns = records
            .iter()
            .flat_map(|r| r.fields.keys().cloned())
            .unique()
            .collect();
        ResultTable { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        for column in record.fields.keys() {
            if !self.has_column(column) {
                self.columns.push(column.clone());
            }
        }
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.push(record);
        }
    }

    /// Adds a column computed from each row. Rows for which `f` returns `None`
    /// get no value in that column.
    pub fn add_derived_column(
        &mut self,
        column: impl Into<String>,
        f: impl Fn(&Record) -> Option<Value>,
    ) {
        let column = column.into();
        for record in self.records.iter_mut() {
            if let Some(v) = f(record) {
                record.insert(column.clone(), v);
            }
        }
        if !self.has_column(&column) {
            self.columns.push(column);
        }
    }

    pub fn filter(&self, predicate: impl Fn(&Record) -> bool) -> ResultTable {
        ResultTable {
            columns: self.columns.clone(),
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }

    /// Stable sort on one column; rows missing the column go last.
    pub fn sort_by_column(&mut self, column: &str) {
        self.records
            .sort_by(|a, b| match (a.get(column), b.get(column)) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> ResultTable {
        ResultTable {
            columns: self.columns.clone(),
            records: self.records.iter().take(n).cloned().collect(),
        }
    }

    /// Distinct values of a column, sorted.
    pub fn distinct(&self, column: &str) -> Vec<Value> {
        let mut values: Vec<Value> = Vec::new();
        for v in self.records.iter().filter_map(|r| r.get(column)) {
            if !values.contains(v) {
                values.push(v.clone());
            }
        }
        values.sort_by(Value::total_cmp);
        values
    }
}

/// Pads cells into aligned, right-justified columns.
pub fn format_table(header: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(String::len)
                .chain(core::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    core::iter::once(header.to_vec())
        .chain(rows.iter().cloned())
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:>w$}", cell, w = w))
                .join("  ")
        })
        .join("\n")
}

impl Display for ResultTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return write!(f, "Empty table\nColumns: [{}]", self.columns.join(", "));
        }
        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| r.get(c).map_or_else(|| "NaN".to_owned(), |v| v.to_string()))
                    .collect()
            })
            .collect();
        write!(f, "{}", format_table(&self.columns, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(instance: &str, threads: i64, tps: f64) -> Record {
        Record::from_iter([
            ("Instance", Value::from(instance)),
            ("Threads", Value::from(threads)),
            ("TPS", Value::from(tps)),
        ])
    }

    #[test]
    fn sort_by_numeric_column() {
        let mut table = ResultTable::from_records(vec![
            record("a", 16, 1.0),
            record("b", 1, 2.0),
            record("c", 4, 3.0),
        ]);
        table.sort_by_column("Threads");
        let threads: Vec<i64> = table
            .records()
            .iter()
            .filter_map(|r| r.get("Threads").and_then(Value::as_i64))
            .collect();
        assert_eq!(threads, vec![1, 4, 16]);
    }

    #[test]
    fn derived_column_skips_rows_without_value() {
        let mut table = ResultTable::from_records(vec![record("a", 1, 10.0), record("b", 1, 20.0)]);
        table.add_derived_column("Double", |r| {
            if r.get_str("Instance") == Some("a") {
                r.get_f64("TPS").map(|t| Value::Float(t * 2.0))
            } else {
                None
            }
        });
        assert!(table.has_column("Double"));
        assert_eq!(table.records()[0].get_f64("Double"), Some(20.0));
        assert_eq!(table.records()[1].get("Double"), None);
    }

    #[test]
    fn filter_keeps_columns() {
        let table = ResultTable::from_records(vec![record("a", 1, 10.0), record("b", 2, 20.0)]);
        let subset = table.filter(|r| r.get_str("Instance") == Some("z"));
        assert!(subset.is_empty());
        assert_eq!(subset.columns(), table.columns());
    }

    #[test]
    fn distinct_values_are_sorted() {
        let table = ResultTable::from_records(vec![
            record("b", 8, 1.0),
            record("a", 2, 1.0),
            record("b", 2, 1.0),
        ]);
        assert_eq!(table.distinct("Instance"), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(table.distinct("Threads"), vec![Value::from(2), Value::from(8)]);
    }

    #[test]
    fn display_aligns_columns() {
        let table = ResultTable::from_records(vec![record("t3.medium", 1, 10.0)]);
        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
        assert!(lines[1].contains("t3.medium"));
        assert!(lines[1].contains("10.00"));
    }
}
