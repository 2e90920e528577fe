//! Plain-text tables for terminal output of datasets and profiles.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{data::Dataset, profile::DatasetProfile};

/// Cells wider than this are cut and suffixed with `…`.
pub const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers
        .iter()
        .map(|h| display_width(&clip(&sanitize_cell(h))))
        .collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&clip(&sanitize_cell(cell))));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// First `limit` rows of the dataset under its declared columns.
pub fn render_dataset(dataset: &Dataset, limit: usize) -> String {
    let rows = dataset
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            dataset
                .columns
                .iter()
                .map(|column| {
                    row.get(column)
                        .map(|value| value.cell_text().into_owned())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect::<Vec<Vec<String>>>();
    render_table(&dataset.columns, &rows)
}

pub fn render_profile(profile: &DatasetProfile) -> String {
    let headers = ["column", "type", "missing", "unique", "example"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = profile
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.inferred_type.to_string(),
                column.missing_count.to_string(),
                column.unique_count.to_string(),
                column.example.cell_text().into_owned(),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = format!(
        "rows: {}  columns: {}  completeness: {}%\n\n",
        profile.total_rows, profile.total_columns, profile.completeness_score
    );
    output.push_str(&render_table(&headers, &rows));
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (value, width) in values.iter().zip(widths) {
        let clipped = clip(&sanitize_cell(value)).into_owned();
        let padding = width.saturating_sub(display_width(&clipped));
        cells.push(format!("{clipped}{}", " ".repeat(padding)));
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn clip(value: &str) -> Cow<'_, str> {
    if display_width(value) <= MAX_CELL_WIDTH {
        return Cow::Borrowed(value);
    }
    let mut clipped = value.chars().take(MAX_CELL_WIDTH - 1).collect::<String>();
    clipped.push('…');
    Cow::Owned(clipped)
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
