//! Per-column and whole-dataset statistics.
//!
//! Profiling is a full recompute over the rows. Columns come from the first
//! row's keys; a key missing from a later row counts as a missing value.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InferredType {
    Number,
    String,
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferredType::Number => write!(f, "Number"),
            InferredType::String => write!(f, "String"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    pub missing_count: usize,
    pub unique_count: usize,
    pub example: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns: Vec<ColumnProfile>,
    pub completeness_score: u8,
}

impl DatasetProfile {
    pub fn empty() -> Self {
        Self {
            total_rows: 0,
            total_columns: 0,
            columns: Vec::new(),
            completeness_score: 0,
        }
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Strict-equality identity of a cell: `30` and `"30"` differ, as do an
/// absent key and an explicit null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Absent,
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Identity {
    fn of(value: Option<&Value>) -> Identity {
        match value {
            None => Identity::Absent,
            Some(Value::Null) => Identity::Null,
            Some(Value::Bool(b)) => Identity::Bool(*b),
            // -0.0 and 0.0 collapse to one bucket.
            Some(Value::Number(n)) => Identity::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Some(Value::Text(s)) => Identity::Text(s.clone()),
        }
    }
}

struct ColumnAccumulator {
    name: String,
    missing: usize,
    present: usize,
    all_numeric: bool,
    example: Option<Value>,
    distinct: HashSet<Identity>,
}

impl ColumnAccumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            missing: 0,
            present: 0,
            all_numeric: true,
            example: None,
            distinct: HashSet::new(),
        }
    }

    fn ingest(&mut self, value: Option<&Value>) {
        self.distinct.insert(Identity::of(value));
        match value {
            Some(v) if !v.is_missing() => {
                self.present += 1;
                self.all_numeric &= v.is_number();
                if self.example.is_none() {
                    self.example = Some(v.clone());
                }
            }
            _ => self.missing += 1,
        }
    }

    fn finish(self) -> ColumnProfile {
        let inferred_type = if self.present > 0 && self.all_numeric {
            InferredType::Number
        } else {
            InferredType::String
        };
        ColumnProfile {
            name: self.name,
            inferred_type,
            missing_count: self.missing,
            unique_count: self.distinct.len(),
            example: self.example.unwrap_or(Value::Null),
        }
    }
}

pub fn profile(rows: &[Row]) -> DatasetProfile {
    let Some(first) = rows.first() else {
        return DatasetProfile::empty();
    };
    let mut accumulators = first.keys().map(ColumnAccumulator::new).collect::<Vec<_>>();
    for row in rows {
        for accumulator in &mut accumulators {
            accumulator.ingest(row.get(&accumulator.name));
        }
    }

    let columns = accumulators
        .into_iter()
        .map(ColumnAccumulator::finish)
        .collect::<Vec<_>>();
    let total_cells = rows.len() * columns.len();
    let total_missing: usize = columns.iter().map(|c| c.missing_count).sum();
    DatasetProfile {
        total_rows: rows.len(),
        total_columns: columns.len(),
        completeness_score: completeness(total_cells, total_missing),
        columns,
    }
}

/// Percentage of non-missing cells, rounded half up; 0 when there are no cells.
pub fn completeness(total_cells: usize, total_missing: usize) -> u8 {
    if total_cells == 0 {
        return 0;
    }
    let filled = total_cells.saturating_sub(total_missing) as f64;
    let score = (100.0 * filled / total_cells as f64 + 0.5).floor();
    score.clamp(0.0, 100.0) as u8
}
