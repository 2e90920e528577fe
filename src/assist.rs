//! Boundary to an external assistant (typically a language model).
//!
//! The engine never talks to the service itself. Callers implement
//! [`Assistant`]; the functions here decide what to send, and validate what
//! comes back before any of it reaches a [`Workspace`](crate::history::Workspace).
//! Responses are treated as untrusted text: code fences are stripped and the
//! remainder must parse into the expected JSON shape.

use anyhow::Result;
use log::{debug, warn};
use serde::Deserialize;

use crate::{
    data::{Dataset, Row},
    error::{EngineError, EngineResult},
    join::{JoinStrategy, JoinType},
    profile::DatasetProfile,
};

pub const JOIN_SAMPLE_ROWS: usize = 5;
pub const RULE_SAMPLE_ROWS: usize = 10;
pub const DEFAULT_RULES: [&str; 3] = [
    "Standardize formats",
    "Remove duplicates",
    "Fill missing values",
];
/// Returned when the assistant answers a profile summary with nothing.
pub const SUMMARY_UNAVAILABLE: &str = "Data analysis unavailable.";
/// Returned when the profile summary request fails.
pub const SUMMARY_FAILED: &str = "Unable to generate AI summary at this time.";

pub trait Assistant {
    /// Rewrite `rows` according to a natural-language instruction.
    fn rewrite(&self, rows: &[Row], instruction: &str) -> Result<String>;

    /// Propose how two datasets should be joined.
    fn suggest_join(
        &self,
        primary_headers: &[String],
        primary_sample: &[Row],
        secondary_headers: &[String],
        secondary_sample: &[Row],
    ) -> Result<String>;

    /// Propose short cleaning rules for a sample of rows.
    fn suggest_rules(&self, sample: &[Row]) -> Result<String>;

    /// Describe data quality in a sentence or two. Implementations usually
    /// send [`profile_digest`] rather than the full profile.
    fn summarize_profile(&self, profile: &DatasetProfile) -> Result<String>;
}

/// Removes markdown code fences and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_rewrite_response(text: &str) -> EngineResult<Vec<Row>> {
    let cleaned = strip_code_fences(text);
    let shape: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|err| EngineError::external(format!("response is not JSON: {err}")))?;
    if !shape.is_array() {
        return Err(EngineError::external("response is not a JSON array"));
    }
    serde_json::from_str::<Vec<Row>>(&cleaned)
        .map_err(|err| EngineError::external(format!("response array holds non-record items: {err}")))
}

pub fn rewrite_rows<A: Assistant + ?Sized>(
    assistant: &A,
    rows: &[Row],
    instruction: &str,
) -> EngineResult<Vec<Row>> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(EngineError::external("rewrite instruction is empty"));
    }
    debug!("Requesting rewrite of {} row(s): {instruction}", rows.len());
    let response = assistant
        .rewrite(rows, instruction)
        .map_err(|err| EngineError::external(format!("rewrite request failed: {err:#}")))?;
    parse_rewrite_response(&response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinSuggestion {
    join_type: String,
    primary_key: String,
    secondary_key: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

pub fn parse_join_suggestion(
    text: &str,
    primary_columns: &[String],
    secondary_columns: &[String],
) -> EngineResult<JoinStrategy> {
    let cleaned = strip_code_fences(text);
    let suggestion: JoinSuggestion = serde_json::from_str(&cleaned)
        .map_err(|err| EngineError::external(format!("join suggestion is malformed: {err}")))?;
    let join_type = match suggestion.join_type.trim().to_ascii_lowercase().as_str() {
        "inner" => JoinType::Inner,
        "left" => JoinType::Left,
        "outer" | "full" => JoinType::Outer,
        other => {
            return Err(EngineError::external(format!(
                "unsupported join type '{other}'"
            )));
        }
    };
    if !primary_columns.contains(&suggestion.primary_key) {
        return Err(EngineError::external(format!(
            "suggested primary key '{}' is not a column",
            suggestion.primary_key
        )));
    }
    if !secondary_columns.contains(&suggestion.secondary_key) {
        return Err(EngineError::external(format!(
            "suggested secondary key '{}' is not a column",
            suggestion.secondary_key
        )));
    }
    Ok(JoinStrategy {
        join_type,
        primary_key_column: suggestion.primary_key,
        secondary_key_column: suggestion.secondary_key,
        confidence: suggestion
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        reasoning: suggestion.reasoning.unwrap_or_default(),
    })
}

fn sample(rows: &[Row], limit: usize) -> &[Row] {
    &rows[..rows.len().min(limit)]
}

pub fn suggest_join<A: Assistant + ?Sized>(
    assistant: &A,
    primary: &Dataset,
    secondary: &Dataset,
) -> EngineResult<JoinStrategy> {
    let response = assistant
        .suggest_join(
            &primary.columns,
            sample(&primary.rows, JOIN_SAMPLE_ROWS),
            &secondary.columns,
            sample(&secondary.rows, JOIN_SAMPLE_ROWS),
        )
        .map_err(|err| EngineError::external(format!("join suggestion failed: {err:#}")))?;
    parse_join_suggestion(&response, &primary.columns, &secondary.columns)
}

/// Like [`suggest_join`], but any failure yields [`JoinStrategy::fallback`].
pub fn suggest_join_or_fallback<A: Assistant + ?Sized>(
    assistant: &A,
    primary: &Dataset,
    secondary: &Dataset,
) -> JoinStrategy {
    suggest_join(assistant, primary, secondary).unwrap_or_else(|err| {
        warn!("{err}; using default join strategy");
        JoinStrategy::fallback(&primary.columns, &secondary.columns)
    })
}

pub fn suggest_rules<A: Assistant + ?Sized>(assistant: &A, rows: &[Row]) -> Vec<String> {
    let parsed = assistant
        .suggest_rules(sample(rows, RULE_SAMPLE_ROWS))
        .map_err(|err| format!("{err:#}"))
        .and_then(|text| {
            serde_json::from_str::<Vec<String>>(&strip_code_fences(&text))
                .map_err(|err| err.to_string())
        });
    match parsed {
        Ok(rules) if !rules.is_empty() => rules,
        Ok(_) => default_rules(),
        Err(err) => {
            warn!("Rule suggestion unavailable ({err}); using defaults");
            default_rules()
        }
    }
}

fn default_rules() -> Vec<String> {
    DEFAULT_RULES.iter().map(|rule| rule.to_string()).collect()
}

/// Row count, column names, total missing cells and completeness, one per line.
pub fn profile_digest(profile: &DatasetProfile) -> String {
    let columns = profile
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Rows: {}\nColumns: {}\nMissing Values: {}\nCompleteness: {}%",
        profile.total_rows,
        columns,
        profile.total_missing(),
        profile.completeness_score
    )
}

/// Plain-text quality summary; never fails.
pub fn profile_summary<A: Assistant + ?Sized>(assistant: &A, profile: &DatasetProfile) -> String {
    match assistant.summarize_profile(profile) {
        Ok(text) if text.trim().is_empty() => SUMMARY_UNAVAILABLE.to_string(),
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            warn!("Profile summary unavailable ({err:#})");
            SUMMARY_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fences_handles_json_blocks() {
        assert_eq!(strip_code_fences("```json\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  []  "), "[]");
    }

    #[test]
    fn rewrite_response_must_be_array_of_records() {
        assert!(parse_rewrite_response(r#"{"a":1}"#).is_err());
        assert!(parse_rewrite_response("[1, 2]").is_err());
        assert!(parse_rewrite_response("Sure! Here you go").is_err());
        let rows = parse_rewrite_response("```json\n[{\"a\":1}]\n```").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn profile_digest_lists_headline_numbers() {
        let rows: Vec<Row> = vec![
            [("name", crate::data::Value::text("Ann")), ("age", crate::data::Value::Null)]
                .into_iter()
                .collect(),
        ];
        let profile = crate::profile::profile(&rows);
        assert_eq!(
            profile_digest(&profile),
            "Rows: 1\nColumns: name, age\nMissing Values: 1\nCompleteness: 50%"
        );
    }

    #[test]
    fn join_suggestion_validates_columns_and_clamps_confidence() {
        let primary = vec!["id".to_string()];
        let secondary = vec!["user_id".to_string()];
        let ok = parse_join_suggestion(
            r#"{"joinType":"INNER","primaryKey":"id","secondaryKey":"user_id","confidence":1.7}"#,
            &primary,
            &secondary,
        )
        .unwrap();
        assert_eq!(ok.join_type, JoinType::Inner);
        assert_eq!(ok.confidence, 1.0);

        let missing = parse_join_suggestion(
            r#"{"joinType":"left","primaryKey":"nope","secondaryKey":"user_id"}"#,
            &primary,
            &secondary,
        );
        assert!(matches!(missing, Err(EngineError::ExternalCallFailure(_))));
    }
}
