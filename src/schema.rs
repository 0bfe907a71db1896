//! Dataset model: classified columns plus normalized rows.
//!
//! A [`Dataset`] is built once per input (see [`Dataset::from_text_records()`],
//! [`Dataset::from_records()`] and [`Dataset::from_keyed_rows()`]). Building it
//! normalizes every header and text cell exactly once and classifies every
//! column; both are immutable afterwards. Rows are stored as cell vectors
//! aligned with the column order.

use std::{collections::HashMap, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{ClassifierOptions, classify_with},
    data::{Value, parse_cell},
    normalize::{normalize, normalize_value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Identifier,
    Categorical,
    Percentage,
    Duration,
    Text,
    Metric,
    Unknown,
}

impl ColumnType {
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Identifier,
        ColumnType::Categorical,
        ColumnType::Percentage,
        ColumnType::Duration,
        ColumnType::Text,
        ColumnType::Metric,
        ColumnType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Identifier => "IDENTIFIER",
            ColumnType::Categorical => "CATEGORICAL",
            ColumnType::Percentage => "PERCENTAGE",
            ColumnType::Duration => "DURATION",
            ColumnType::Text => "TEXT",
            ColumnType::Metric => "METRIC",
            ColumnType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub index: usize,
    pub original_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub sample_value: Value,
}

impl Column {
    pub fn is(&self, ty: ColumnType) -> bool {
        self.column_type == ty
    }
}

static EMPTY_CELL: Value = Value::Empty;

/// One record: parsed cells for the analytics plus the cell text as it was
/// read, which is what exports and previews show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
    texts: Vec<String>,
}

impl Row {
    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&EMPTY_CELL)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Source text of a cell, after mojibake repair. `01234567` stays
    /// `01234567` even though it is analysed as a number.
    pub fn text(&self, index: usize) -> &str {
        self.texts.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    fn fit(mut self, width: usize) -> Self {
        self.values.resize(width, Value::Empty);
        self.texts.resize(width, String::new());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Builds a dataset from raw cell text, as read from a CSV source.
    ///
    /// Each cell is parsed with [`parse_cell`] for the analytics while its
    /// text is kept for output. Short records are padded with empty cells and
    /// long ones are truncated.
    pub fn from_text_records(
        headers: &[String],
        records: Vec<Vec<String>>,
        options: &ClassifierOptions,
    ) -> Self {
        let width = headers.len();
        let rows = records
            .into_iter()
            .map(|record| {
                let (values, texts): (Vec<Value>, Vec<String>) = record
                    .into_iter()
                    .take(width)
                    .map(|raw| {
                        let value = normalize_value(parse_cell(&raw));
                        let text = normalize(&raw).into_owned();
                        (value, text)
                    })
                    .unzip();
                Row { values, texts }.fit(width)
            })
            .collect();
        Self::build(headers, rows, options)
    }

    /// Builds a dataset from already-typed, index-aligned records. Cell text
    /// is the display form of each value.
    pub fn from_records(
        headers: &[String],
        records: Vec<Vec<Value>>,
        options: &ClassifierOptions,
    ) -> Self {
        let width = headers.len();
        let rows = records
            .into_iter()
            .map(|record| {
                let values = record
                    .into_iter()
                    .take(width)
                    .map(normalize_value)
                    .collect::<Vec<_>>();
                let texts = values.iter().map(Value::as_display).collect();
                Row { values, texts }.fit(width)
            })
            .collect();
        Self::build(headers, rows, options)
    }

    /// Builds a dataset from rows keyed by original header text. Keys missing
    /// from a row become empty cells.
    pub fn from_keyed_rows(
        headers: &[String],
        rows: &[HashMap<String, Value>],
        options: &ClassifierOptions,
    ) -> Self {
        let records = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|header| row.get(header).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self::from_records(headers, records, options)
    }

    fn build(headers: &[String], rows: Vec<Row>, options: &ClassifierOptions) -> Self {
        let width = headers.len();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let name = normalize(header).into_owned();
                let values = rows
                    .iter()
                    .map(|row| row.get(index).clone())
                    .collect::<Vec<_>>();
                let column_type = classify_with(&name, &values, index, width, options);
                debug!("Column {} '{}' classified as {}", index + 1, name, column_type);
                Column {
                    index,
                    original_name: header.clone(),
                    name,
                    column_type,
                    sample_value: values.first().cloned().unwrap_or_default(),
                }
            })
            .collect();

        Dataset { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn first_of_type(&self, ty: ColumnType) -> Option<&Column> {
        self.columns.iter().find(|c| c.is(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_records_normalizes_headers_and_cells() {
        let dataset = Dataset::from_records(
            &headers(&["DuraciÃ³n", "Registrado"]),
            vec![vec![Value::Number(12.0), Value::from("SÃ")]],
            &ClassifierOptions::default(),
        );
        assert_eq!(dataset.columns()[0].name, "duración");
        assert_eq!(dataset.columns()[0].original_name, "DuraciÃ³n");
        assert_eq!(dataset.rows()[0].get(1), &Value::Text("Sí".to_string()));
    }

    #[test]
    fn from_records_pads_and_truncates_rows() {
        let dataset = Dataset::from_records(
            &headers(&["a", "b"]),
            vec![
                vec![Value::from("x")],
                vec![Value::from("x"), Value::from("y"), Value::from("z")],
            ],
            &ClassifierOptions::default(),
        );
        assert_eq!(dataset.rows()[0].values(), &[Value::from("x"), Value::Empty]);
        assert_eq!(dataset.rows()[1].values().len(), 2);
    }

    #[test]
    fn from_keyed_rows_fills_missing_keys() {
        let mut row = HashMap::new();
        row.insert("nombre".to_string(), Value::from("Ana"));
        let dataset = Dataset::from_keyed_rows(
            &headers(&["nombre", "nota"]),
            &[row],
            &ClassifierOptions::default(),
        );
        let first = &dataset.rows()[0];
        assert_eq!(first.get(0), &Value::from("Ana"));
        assert_eq!(first.get(1), &Value::Empty);
        assert_eq!(first.text(1), "");
    }

    #[test]
    fn text_records_keep_source_text_of_numeric_cells() {
        let dataset = Dataset::from_text_records(
            &headers(&["dni", "progreso", "estado"]),
            vec![
                vec!["01234567".to_string(), "80.50".to_string(), "SÃ".to_string()],
                vec!["00987654".to_string()],
            ],
            &ClassifierOptions::default(),
        );
        let first = &dataset.rows()[0];
        assert_eq!(first.get(0), &Value::Number(1234567.0));
        assert_eq!(first.text(0), "01234567");
        assert_eq!(first.get(1), &Value::Number(80.5));
        assert_eq!(first.text(1), "80.50");
        assert_eq!(first.get(2), &Value::Text("Sí".to_string()));
        assert_eq!(first.text(2), "Sí");

        let second = &dataset.rows()[1];
        assert_eq!(second.texts(), &["00987654", "", ""]);
        assert_eq!(second.get(2), &Value::Empty);
        assert_eq!(dataset.columns()[0].column_type, ColumnType::Identifier);
    }

    #[test]
    fn sample_value_is_first_row_cell() {
        let dataset = Dataset::from_records(
            &headers(&["nota"]),
            vec![vec![Value::Number(3.0)], vec![Value::Number(4.0)]],
            &ClassifierOptions::default(),
        );
        assert_eq!(dataset.columns()[0].sample_value, Value::Number(3.0));
    }
}
