//! Bulk find and replace across one column or every column.
//!
//! Both operations share [`build_pattern`]. Literal searches are escaped
//! before compilation so the same regex engine serves both modes. A pattern
//! that fails to compile never escapes these functions: counting yields 0 and
//! replacing returns the rows untouched, with the failure logged.

use std::borrow::Cow;

use log::{error, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Row, Value},
    error::{EngineError, EngineResult},
    transform::string_ops,
};

/// Column selector that targets every key of every row.
pub const ALL_COLUMNS: &str = "__all__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindReplace {
    #[serde(default = "all_columns")]
    pub column: String,
    pub find: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default)]
    pub match_case: bool,
    #[serde(default)]
    pub use_regex: bool,
}

fn all_columns() -> String {
    ALL_COLUMNS.to_string()
}

impl FindReplace {
    pub fn count(&self, rows: &[Row]) -> usize {
        count_matches(rows, &self.column, &self.find, self.match_case, self.use_regex)
    }

    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        replace(
            rows,
            &self.column,
            &self.find,
            &self.replace,
            self.match_case,
            self.use_regex,
        )
    }

    /// History label for this replacement.
    pub fn describe(&self) -> String {
        format!("Find '{}' & Replace", self.find)
    }
}

pub fn build_pattern(find: &str, match_case: bool, use_regex: bool) -> EngineResult<Regex> {
    let source: Cow<'_, str> = if use_regex {
        Cow::Borrowed(find)
    } else {
        Cow::Owned(regex::escape(find))
    };
    RegexBuilder::new(&source)
        .case_insensitive(!match_case)
        .build()
        .map_err(|source| EngineError::InvalidPattern {
            pattern: find.to_string(),
            source,
        })
}

fn targets<'a>(row: &'a Row, column: &'a str) -> Vec<&'a str> {
    if column == ALL_COLUMNS {
        row.keys().collect()
    } else {
        vec![column]
    }
}

/// Number of cells (not occurrences) the pattern matches.
pub fn count_matches(
    rows: &[Row],
    column: &str,
    find: &str,
    match_case: bool,
    use_regex: bool,
) -> usize {
    if find.is_empty() {
        return 0;
    }
    let regex = match build_pattern(find, match_case, use_regex) {
        Ok(regex) => regex,
        Err(err) => {
            warn!("{err}; reporting 0 matches");
            return 0;
        }
    };
    rows.iter()
        .map(|row| {
            targets(row, column)
                .into_iter()
                .filter(|key| {
                    let text = row.get(key).map(Value::cell_text).unwrap_or_default();
                    regex.is_match(&text)
                })
                .count()
        })
        .sum()
}

/// Substitutes every occurrence in each targeted, non-null cell.
///
/// Every targeted non-null cell comes back as text, matched or not. Keys
/// absent from a row are never created.
pub fn replace(
    rows: &[Row],
    column: &str,
    find: &str,
    replacement: &str,
    match_case: bool,
    use_regex: bool,
) -> Vec<Row> {
    if find.is_empty() {
        return rows.to_vec();
    }
    let regex = match build_pattern(find, match_case, use_regex) {
        Ok(regex) => regex,
        Err(err) => {
            error!("Find/replace skipped: {err}");
            return rows.to_vec();
        }
    };
    rows.iter()
        .map(|row| {
            let mut updated = row.clone();
            for (key, value) in updated.iter_mut() {
                if column != ALL_COLUMNS && key != column {
                    continue;
                }
                if value.is_null() {
                    continue;
                }
                let rewritten =
                    string_ops::regex_replace(&value.cell_text(), &regex, replacement, use_regex)
                        .into_owned();
                *value = Value::Text(rewritten);
            }
            updated
        })
        .collect()
}
