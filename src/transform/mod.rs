//! Small deterministic row-set transforms.
//!
//! Each function returns new rows and leaves non-text values alone.

pub mod string_ops;

use std::{borrow::Cow, collections::HashSet, fmt, str::FromStr};

use anyhow::{Error, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Row, Value};

fn map_text<F>(rows: &[Row], op: F) -> Vec<Row>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    rows.iter()
        .map(|row| {
            row.map_values(|value| match value {
                Value::Text(s) => Value::Text(op(s).into_owned()),
                other => other.clone(),
            })
        })
        .collect()
}

pub fn trim_whitespace(rows: &[Row]) -> Vec<Row> {
    map_text(rows, string_ops::trim)
}

pub fn to_lowercase(rows: &[Row]) -> Vec<Row> {
    map_text(rows, string_ops::lowercase)
}

/// Keeps the first of any rows whose serialized content (keys in order) is identical.
pub fn remove_duplicates(rows: &[Row]) -> Vec<Row> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(row.to_json_string()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Trim,
    Dedupe,
    Lowercase,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::Trim => "Trim Whitespace",
            QuickAction::Dedupe => "Remove Duplicates",
            QuickAction::Lowercase => "Convert to Lowercase",
        }
    }

    pub fn apply(self, rows: &[Row]) -> Vec<Row> {
        match self {
            QuickAction::Trim => trim_whitespace(rows),
            QuickAction::Dedupe => remove_duplicates(rows),
            QuickAction::Lowercase => to_lowercase(rows),
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuickAction {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trim" => Ok(QuickAction::Trim),
            "dedupe" | "distinct" => Ok(QuickAction::Dedupe),
            "lowercase" | "lower" => Ok(QuickAction::Lowercase),
            other => Err(anyhow!("Unknown quick action '{other}'")),
        }
    }
}
