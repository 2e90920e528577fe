//! Schema-less row model shared by every engine module.
//!
//! A [`Row`] keeps its fields in insertion order and distinguishes a field that
//! is absent from one that is present with [`Value::Null`]. A [`Dataset`]
//! pairs rows with a declared column list that drives display and export; the
//! two are allowed to drift apart.

use std::{borrow::Cow, fmt};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

/// Largest integer magnitude that survives an `f64` round trip.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Coerces a raw delimited cell: `""`, `null` and `undefined` become
    /// [`Value::Null`], numeric literals become [`Value::Number`].
    pub fn infer(raw: &str) -> Value {
        match raw {
            "" | "null" | "undefined" => Value::Null,
            other => match parse_number(other) {
                Some(number) => Value::Number(number),
                None => Value::Text(other.to_string()),
            },
        }
    }

    pub fn text(value: impl Into<String>) -> Value {
        Value::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or the empty string.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    /// Text used when a cell is searched or exported; null renders empty.
    pub fn cell_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.as_display()),
        }
    }

    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            nested => Value::Text(nested.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

/// Renders integral numbers without a fractional part (`30`, not `30.0`).
/// Magnitudes from `1e21` up and below `1e-6` use a signed exponent
/// (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude >= 1e21 || magnitude < 1e-6) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        };
    }
    if value.fract() == 0.0 && magnitude <= MAX_SAFE_INTEGER {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Parses a complete numeric literal. Accepts decimal and exponent forms plus
/// `0x`, `0o` and `0b` integer prefixes; rejects infinities and NaN.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for (prefixes, radix) in [(["0x", "0X"], 16), (["0o", "0O"], 8), (["0b", "0B"], 2)] {
        if let Some(digits) = prefixes.iter().find_map(|p| trimmed.strip_prefix(p)) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// One record: ordered, unique keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Replaces the value in place when the key exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies the row, rewriting every value through `f`.
    pub fn map_values<F>(&self, mut f: F) -> Row
    where
        F: FnMut(&Value) -> Value,
    {
        Row {
            fields: self.fields.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        }
    }

    /// Compact JSON with keys in row order.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a record object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            row.insert(key, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// Named rows plus the declared column order used for display and export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Takes the column list from the first row's keys.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let columns = leading_columns(&rows);
        Self::new(name, columns, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Keys that appear in some row but not in the declared columns.
    pub fn undeclared_keys(&self) -> Vec<String> {
        let mut extra: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !self.columns.iter().any(|c| c == key) && !extra.iter().any(|e| e == key) {
                    extra.push(key.to_string());
                }
            }
        }
        extra
    }
}

pub fn leading_columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_coerces_null_sentinels_and_numbers() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("null"), Value::Null);
        assert_eq!(Value::infer("undefined"), Value::Null);
        assert_eq!(Value::infer("30"), Value::Number(30.0));
        assert_eq!(Value::infer("-2.5e1"), Value::Number(-25.0));
        assert_eq!(Value::infer("0x1F"), Value::Number(31.0));
        assert_eq!(Value::infer("Alice"), Value::text("Alice"));
        assert_eq!(Value::infer("Infinity"), Value::text("Infinity"));
        assert_eq!(Value::infer("NaN"), Value::text("NaN"));
        assert_eq!(Value::infer("1_000"), Value::text("1_000"));
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-1.2345e25), "-1.2345e+25");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn cell_text_renders_null_as_empty() {
        assert_eq!(Value::Null.cell_text(), "");
        assert_eq!(Value::Bool(true).cell_text(), "true");
        assert_eq!(Value::Number(1.5).cell_text(), "1.5");
    }

    #[test]
    fn row_insert_keeps_position_of_existing_key() {
        let mut row: Row = [("a", Value::from(1i64)), ("b", Value::from("x"))]
            .into_iter()
            .collect();
        let previous = row.insert("a", "replaced");
        assert_eq!(previous, Some(Value::Number(1.0)));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::text("replaced")));
    }

    #[test]
    fn row_json_preserves_key_order_and_integers() {
        let row: Row = [
            ("z", Value::from(3i64)),
            ("a", Value::Null),
            ("m", Value::from(0.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(row.to_json_string(), r#"{"z":3,"a":null,"m":0.5}"#);
        let back: Row = serde_json::from_str(&row.to_json_string()).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn nested_json_values_are_kept_as_text() {
        let row: Row = serde_json::from_str(r#"{"tags":["a","b"]}"#).unwrap();
        assert_eq!(row.get("tags"), Some(&Value::text(r#"["a","b"]"#)));
    }

    #[test]
    fn dataset_reports_keys_outside_declared_columns() {
        let rows = vec![
            [("id", Value::from(1i64))].into_iter().collect::<Row>(),
            [("id", Value::from(2i64)), ("extra", Value::from("x"))]
                .into_iter()
                .collect::<Row>(),
        ];
        let dataset = Dataset::from_rows("people", rows);
        assert_eq!(dataset.columns, vec!["id".to_string()]);
        assert_eq!(dataset.undeclared_keys(), vec!["extra".to_string()]);
    }
}
