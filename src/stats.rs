//! Progress/duration resolution, normalized values, completions, the progress
//! histogram and scalar means.

use serde::{Deserialize, Serialize};

use crate::{
    classify::ClassifierOptions,
    data::parse_numeric,
    insights::{Correction, CorrectionKind},
    schema::{Column, ColumnType, Dataset, Row},
};

pub const COMPLETION_THRESHOLD: f64 = 100.0;
pub const LOW_PROGRESS_THRESHOLD: f64 = 25.0;

const BUCKETS: [(&str, f64); 5] = [
    ("0-24%", 0.0),
    ("25-49%", 25.0),
    ("50-74%", 50.0),
    ("75-99%", 75.0),
    ("100%", 100.0),
];

/// Columns the analytics are computed from, as dataset column indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedColumns {
    pub progress: Option<usize>,
    pub duration: Option<usize>,
    /// A second percentage column, reported as the average result.
    pub result: Option<usize>,
}

impl ResolvedColumns {
    pub fn progress<'a>(&self, dataset: &'a Dataset) -> Option<&'a Column> {
        self.progress.and_then(|idx| dataset.columns().get(idx))
    }

    pub fn duration<'a>(&self, dataset: &'a Dataset) -> Option<&'a Column> {
        self.duration.and_then(|idx| dataset.columns().get(idx))
    }

    pub fn result<'a>(&self, dataset: &'a Dataset) -> Option<&'a Column> {
        self.result.and_then(|idx| dataset.columns().get(idx))
    }
}

/// Picks the progress and duration columns, falling back to the export's
/// fixed positions when no column was classified for the role.
pub fn resolve_columns(
    dataset: &Dataset,
    options: &ClassifierOptions,
) -> (ResolvedColumns, Vec<Correction>) {
    let columns = dataset.columns();
    let mut corrections = Vec::new();
    let positional = options.positional_fallbacks && columns.len() > options.progress_index;

    let mut progress = dataset.first_of_type(ColumnType::Percentage).map(|c| c.index);
    if progress.is_none() && positional {
        let column = &columns[options.progress_index];
        corrections.push(Correction::new(
            CorrectionKind::ProgressFallback,
            format!(
                "Using column {} ('{}') as progress",
                column_letter(column.index),
                column.name
            ),
        ));
        progress = Some(column.index);
    }

    let mut duration = dataset.first_of_type(ColumnType::Duration).map(|c| c.index);
    if duration.is_none()
        && positional
        && let Some(column) = columns.last()
    {
        corrections.push(Correction::new(
            CorrectionKind::DurationFallback,
            format!("Using last column ('{}') as duration", column.name),
        ));
        duration = Some(column.index);
    }

    if progress.is_none() {
        corrections.push(Correction::new(
            CorrectionKind::MissingProgress,
            "No progress column found; completions, histogram and matrix use 0".to_string(),
        ));
    }
    if duration.is_none() {
        corrections.push(Correction::new(
            CorrectionKind::MissingDuration,
            "No duration column found; engagement matrix omitted".to_string(),
        ));
    }

    let result = columns
        .iter()
        .find(|c| c.is(ColumnType::Percentage) && Some(c.index) != progress)
        .map(|c| c.index);

    (
        ResolvedColumns {
            progress,
            duration,
            result,
        },
        corrections,
    )
}

/// Spreadsheet-style letter for a zero-based column index (0 → A, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Numeric value of a cell, 0 when it does not parse. Percentages stored as
/// fractions in (0, 1] are scaled to 0–100.
pub fn normalized_value(row: &Row, column: Option<&Column>) -> f64 {
    let Some(column) = column else {
        return 0.0;
    };
    let value = parse_numeric(row.get(column.index)).unwrap_or(0.0);
    if column.is(ColumnType::Percentage) && value > 0.0 && value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

pub fn normalized_values(dataset: &Dataset, rows: &[usize], column: Option<&Column>) -> Vec<f64> {
    rows.iter()
        .filter_map(|&idx| dataset.row(idx))
        .map(|row| normalized_value(row, column))
        .collect()
}

pub fn completions(dataset: &Dataset, rows: &[usize], progress: Option<&Column>) -> Vec<usize> {
    if progress.is_none() {
        return Vec::new();
    }
    rows.iter()
        .copied()
        .filter(|&idx| {
            dataset
                .row(idx)
                .is_some_and(|row| normalized_value(row, progress) >= COMPLETION_THRESHOLD)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub range: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    /// Buckets normalized progress values into the five fixed ranges.
    pub fn from_values(values: &[f64]) -> Self {
        let mut counts = [0usize; BUCKETS.len()];
        for value in values {
            counts[bucket_index(*value)] += 1;
        }
        let total = values.len();
        let buckets = BUCKETS
            .iter()
            .zip(counts)
            .map(|((label, _), count)| Bucket {
                range: (*label).to_string(),
                count,
                percentage: if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        Histogram { buckets }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn count(&self, range: &str) -> usize {
        self.buckets
            .iter()
            .find(|b| b.range == range)
            .map(|b| b.count)
            .unwrap_or(0)
    }

    /// Rows under 25% progress.
    pub fn low_progress_count(&self) -> usize {
        self.buckets.first().map(|b| b.count).unwrap_or(0)
    }
}

fn bucket_index(value: f64) -> usize {
    BUCKETS
        .iter()
        .rposition(|(_, lower)| value >= *lower)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_progress: Option<f64>,
    pub avg_duration_high: f64,
    pub avg_duration_low: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_result: Option<f64>,
}

pub fn compute_metrics(dataset: &Dataset, rows: &[usize], columns: &ResolvedColumns) -> Metrics {
    let progress = columns.progress(dataset);
    let duration = columns.duration(dataset);

    let avg_progress = progress.map(|_| mean(&normalized_values(dataset, rows, progress)));
    let avg_result = columns
        .result(dataset)
        .map(|column| mean(&normalized_values(dataset, rows, Some(column))));

    let (mut avg_duration_high, mut avg_duration_low) = (0.0, 0.0);
    if progress.is_some() && duration.is_some() {
        let mut high = Vec::new();
        let mut low = Vec::new();
        for row in rows.iter().filter_map(|&idx| dataset.row(idx)) {
            let p = normalized_value(row, progress);
            let d = normalized_value(row, duration);
            if p >= COMPLETION_THRESHOLD {
                high.push(d);
            } else if p < LOW_PROGRESS_THRESHOLD {
                low.push(d);
            }
        }
        avg_duration_high = mean(&high);
        avg_duration_low = mean(&low);
    }

    Metrics {
        avg_progress,
        avg_duration_high,
        avg_duration_low,
        avg_result,
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Median; the two central values are averaged for even lengths and an empty
/// slice yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
