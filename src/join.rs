use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::{Row, Value};

pub const DEFAULT_COLLISION_SUFFIX: &str = "_2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Keep only primary rows with a match
    Inner,
    /// Keep every primary row
    #[default]
    Left,
    /// Keep every primary row, then append unmatched secondary rows
    Outer,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Outer => write!(f, "outer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStrategy {
    pub join_type: JoinType,
    #[serde(rename = "primaryKey")]
    pub primary_key_column: String,
    #[serde(rename = "secondaryKey")]
    pub secondary_key_column: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl JoinStrategy {
    pub fn new(
        join_type: JoinType,
        primary_key_column: impl Into<String>,
        secondary_key_column: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            primary_key_column: primary_key_column.into(),
            secondary_key_column: secondary_key_column.into(),
            confidence: 0.0,
            reasoning: String::new(),
        }
    }

    /// Left join on the first column of each dataset.
    pub fn fallback(primary_columns: &[String], secondary_columns: &[String]) -> Self {
        let first = |columns: &[String]| columns.first().cloned().unwrap_or_default();
        Self {
            join_type: JoinType::Left,
            primary_key_column: first(primary_columns),
            secondary_key_column: first(secondary_columns),
            confidence: 0.0,
            reasoning: "No suggestion available; joining on the first column of each dataset."
                .to_string(),
        }
    }

    pub fn describe(&self, secondary_name: &str) -> String {
        format!(
            "Merged with {} using {} join on {} = {}",
            secondary_name, self.join_type, self.primary_key_column, self.secondary_key_column
        )
    }
}

/// How a secondary field is merged when the primary row already has that key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Store the secondary value under `<key><suffix>`
    #[default]
    SuffixSecondary,
    /// Discard the secondary value
    PrimaryWins,
    /// Overwrite the primary value
    SecondaryWins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    pub collision: CollisionPolicy,
    pub suffix: String,
    /// Keep null and absent keys out of the lookup so they never match.
    pub skip_missing_keys: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            collision: CollisionPolicy::default(),
            suffix: DEFAULT_COLLISION_SUFFIX.to_string(),
            skip_missing_keys: false,
        }
    }
}

/// Lookup key for `column`: the value's display form, with absent keys
/// spelled `undefined`. `None` only when missing keys are skipped.
fn join_key(row: &Row, column: &str, options: &JoinOptions) -> Option<String> {
    match row.get(column) {
        None | Some(Value::Null) if options.skip_missing_keys => None,
        None => Some("undefined".to_string()),
        Some(value) => Some(value.as_display()),
    }
}

pub fn join(primary: &[Row], secondary: &[Row], strategy: &JoinStrategy) -> Vec<Row> {
    join_with(primary, secondary, strategy, &JoinOptions::default())
}

pub fn join_with(
    primary: &[Row],
    secondary: &[Row],
    strategy: &JoinStrategy,
    options: &JoinOptions,
) -> Vec<Row> {
    let secondary_key = strategy.secondary_key_column.as_str();
    let mut lookup: HashMap<String, &Row> = HashMap::with_capacity(secondary.len());
    for row in secondary {
        if let Some(key) = join_key(row, secondary_key, options) {
            lookup.insert(key, row);
        }
    }
    debug!(
        "Join lookup holds {} key(s) from {} secondary row(s)",
        lookup.len(),
        secondary.len()
    );

    let mut output = Vec::with_capacity(primary.len());
    let mut matched_keys: HashSet<String> = HashSet::new();
    for row in primary {
        let matched = join_key(row, &strategy.primary_key_column, options)
            .and_then(|key| lookup.get(&key).map(|found| (key, *found)));
        match matched {
            Some((key, found)) => {
                output.push(merge_row(row, found, secondary_key, options));
                matched_keys.insert(key);
            }
            None if strategy.join_type == JoinType::Inner => {}
            None => output.push(row.clone()),
        }
    }
    let merged = output.len();

    if strategy.join_type == JoinType::Outer {
        output.extend(
            secondary
                .iter()
                .filter(|row| {
                    join_key(row, secondary_key, options).is_none_or(|key| !matched_keys.contains(&key))
                })
                .cloned(),
        );
    }

    info!(
        "{} join on {} = {}: {} output row(s), {} matched key(s), {} secondary-only row(s)",
        strategy.join_type,
        strategy.primary_key_column,
        strategy.secondary_key_column,
        output.len(),
        matched_keys.len(),
        output.len() - merged
    );
    output
}

fn merge_row(primary: &Row, secondary: &Row, secondary_key: &str, options: &JoinOptions) -> Row {
    let mut merged = primary.clone();
    for (key, value) in secondary.iter() {
        if !primary.contains_key(key) {
            merged.insert(key, value.clone());
            continue;
        }
        if key == secondary_key {
            continue;
        }
        match options.collision {
            CollisionPolicy::SuffixSecondary => {
                merged.insert(format!("{key}{}", options.suffix), value.clone());
            }
            CollisionPolicy::PrimaryWins => {}
            CollisionPolicy::SecondaryWins => {
                merged.insert(key, value.clone());
            }
        }
    }
    merged
}
