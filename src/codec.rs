//! Text import and export for datasets.
//!
//! Delimited input is split line by line with a quote-parity rule rather than
//! a full CSV state machine: a delimiter is a field boundary only when an even
//! number of `"` characters follows it on the same line. Lines whose field
//! count disagrees with the header are dropped and reported back to the
//! caller in [`Import::dropped`]. Structured input is a JSON array of objects.
//!
//! Export of delimited text goes through the `csv` writer, which quotes any
//! field holding the delimiter, a quote, or a line break.

use std::path::Path;

use clap::ValueEnum;
use csv::QuoteStyle;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    data::{Dataset, Row, Value},
    error::{EngineError, EngineResult, RowMismatch},
};

pub const DEFAULT_DELIMITER: u8 = b',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Delimited text with a header line (CSV, TSV, ...)
    Delimited,
    /// A JSON array of records
    Structured,
}

impl Format {
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Structured,
            _ => Format::Delimited,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Delimited => "csv",
            Format::Structured => "json",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub delimiter: u8,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// A parsed dataset plus the data lines that had to be discarded.
#[derive(Debug, Clone)]
pub struct Import {
    pub dataset: Dataset,
    pub dropped: Vec<RowMismatch>,
}

pub fn parse(text: &str, format: Format, name: &str, options: &ParseOptions) -> EngineResult<Import> {
    match format {
        Format::Delimited => parse_delimited(text, name, options.delimiter),
        Format::Structured => parse_structured(text, name).map(|dataset| Import {
            dataset,
            dropped: Vec::new(),
        }),
    }
}

pub fn parse_delimited(text: &str, name: &str, delimiter: u8) -> EngineResult<Import> {
    let delimiter = char::from(delimiter);
    let lines = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    let Some((header_line, data_lines)) = lines.split_first() else {
        return Err(EngineError::malformed("input contains no header line"));
    };
    if data_lines.is_empty() {
        return Err(EngineError::malformed("input contains no data rows"));
    }

    let mut columns: Vec<String> = Vec::new();
    let header_fields = split_fields(header_line, delimiter);
    let expected = header_fields.len();
    let headers = header_fields
        .into_iter()
        .map(|field| clean_field(field).to_string())
        .collect::<Vec<_>>();
    for header in &headers {
        if !columns.contains(header) {
            columns.push(header.clone());
        }
    }

    let mut rows = Vec::with_capacity(data_lines.len());
    let mut dropped = Vec::new();
    for (idx, line) in data_lines.iter().enumerate() {
        let fields = split_fields(line, delimiter);
        if fields.len() != expected {
            let mismatch = RowMismatch {
                line: idx + 2,
                expected,
                found: fields.len(),
            };
            warn!("Dropping row: {}", EngineError::SchemaMismatch(mismatch));
            dropped.push(mismatch);
            continue;
        }
        let mut row = Row::with_capacity(expected);
        for (header, field) in headers.iter().zip(fields) {
            row.insert(header.as_str(), Value::infer(clean_field(field)));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(EngineError::malformed(format!(
            "none of the {} data row(s) matched the {} header column(s)",
            data_lines.len(),
            expected
        )));
    }
    debug!(
        "Parsed {} row(s) x {} column(s) from '{}' ({} dropped)",
        rows.len(),
        columns.len(),
        name,
        dropped.len()
    );
    Ok(Import {
        dataset: Dataset::new(name, columns, rows),
        dropped,
    })
}

pub fn parse_structured(text: &str, name: &str) -> EngineResult<Dataset> {
    let shape: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| EngineError::malformed(format!("invalid JSON: {err}")))?;
    let records = shape
        .as_array()
        .ok_or_else(|| EngineError::malformed("expected a JSON array of records"))?;
    if records.is_empty() {
        return Err(EngineError::malformed("record array is empty"));
    }
    if let Some(position) = records.iter().position(|record| !record.is_object()) {
        return Err(EngineError::malformed(format!(
            "element {position} is not a record object"
        )));
    }
    // Re-read through `Row` so object key order survives.
    let rows: Vec<Row> = serde_json::from_str(text)
        .map_err(|err| EngineError::malformed(format!("invalid record: {err}")))?;
    debug!("Parsed {} record(s) from '{}'", rows.len(), name);
    Ok(Dataset::from_rows(name, rows))
}

/// Splits on `delimiter` wherever the remainder of the line holds an even
/// number of quote characters.
pub fn split_fields(line: &str, delimiter: char) -> Vec<&str> {
    let total_quotes = line.matches('"').count();
    let mut seen_quotes = 0usize;
    let mut start = 0usize;
    let mut fields = Vec::new();
    for (idx, ch) in line.char_indices() {
        if ch == '"' {
            seen_quotes += 1;
        } else if ch == delimiter && (total_quotes - seen_quotes) % 2 == 0 {
            fields.push(&line[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Trims and removes one leading and one trailing quote.
fn clean_field(field: &str) -> &str {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}

pub fn serialize(dataset: &Dataset, format: Format, delimiter: u8) -> EngineResult<String> {
    match format {
        Format::Delimited => serialize_delimited(dataset, delimiter),
        Format::Structured => serialize_structured(dataset),
    }
}

pub fn serialize_delimited(dataset: &Dataset, delimiter: u8) -> EngineResult<String> {
    if dataset.columns.is_empty() {
        return Ok(String::new());
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(Vec::new());
    writer
        .write_record(&dataset.columns)
        .map_err(|err| EngineError::Serialization(err.to_string()))?;
    let single_column = dataset.columns.len() == 1;
    let mut lone_empty_fields = Vec::new();
    for row in &dataset.rows {
        let cells = dataset
            .columns
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|v| v.cell_text().into_owned())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        if single_column && cells.iter().all(String::is_empty) {
            // The writer quotes a record holding one empty field as `""`.
            writer
                .flush()
                .map_err(|err| EngineError::Serialization(err.to_string()))?;
            lone_empty_fields.push(writer.get_ref().len());
        }
        writer
            .write_record(&cells)
            .map_err(|err| EngineError::Serialization(err.to_string()))?;
    }
    let mut bytes = writer
        .into_inner()
        .map_err(|err| EngineError::Serialization(err.to_string()))?;
    for offset in lone_empty_fields.into_iter().rev() {
        if bytes.get(offset..offset + 2) == Some(b"\"\"".as_slice()) {
            bytes.drain(offset..offset + 2);
        }
    }
    String::from_utf8(bytes).map_err(|err| EngineError::Serialization(err.to_string()))
}

pub fn serialize_structured(dataset: &Dataset) -> EngineResult<String> {
    serde_json::to_string_pretty(&dataset.rows)
        .map_err(|err| EngineError::Serialization(err.to_string()))
}

#[derive(Serialize)]
struct Envelope<'a, M: Serialize> {
    metadata: &'a M,
    data: &'a [Row],
}

/// Pretty JSON of the form `{ "metadata": ..., "data": [...] }`.
pub fn serialize_structured_with_metadata<M: Serialize>(
    dataset: &Dataset,
    metadata: &M,
) -> EngineResult<String> {
    let envelope = Envelope {
        metadata,
        data: &dataset.rows,
    };
    serde_json::to_string_pretty(&envelope)
        .map_err(|err| EngineError::Serialization(err.to_string()))
}

/// Default download name for an exported dataset: `clean_<stem>.<ext>`.
pub fn export_file_name(name: &str, format: Format) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("dataset");
    format!("clean_{stem}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_fields_respects_quoted_delimiters() {
        let fields = split_fields(r#"1,"Smith, John",NY"#, ',');
        assert_eq!(fields, vec!["1", r#""Smith, John""#, "NY"]);
    }

    #[test]
    fn split_fields_uses_custom_delimiter() {
        assert_eq!(split_fields("a;b;;c", ';'), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn clean_field_strips_single_quote_pair() {
        assert_eq!(clean_field(r#"  "hello"  "#), "hello");
        assert_eq!(clean_field(r#""""#), "");
        assert_eq!(clean_field(r#"""x"""#), r#""x""#);
    }

    #[test]
    fn export_file_name_replaces_extension() {
        assert_eq!(export_file_name("sales.json", Format::Delimited), "clean_sales.csv");
        assert_eq!(export_file_name("sales.csv", Format::Structured), "clean_sales.json");
        assert_eq!(export_file_name("", Format::Delimited), "clean_dataset.csv");
    }

    #[test]
    fn format_from_path_detects_json() {
        assert_eq!(Format::from_path(Path::new("a.JSON")), Format::Structured);
        assert_eq!(Format::from_path(Path::new("a.tsv")), Format::Delimited);
    }
}
