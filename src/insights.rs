//! One-shot analysis of a [`Dataset`].
//!
//! [`analyze()`] runs segmentation, column resolution, completions, the
//! histogram, scalar metrics and the engagement matrix in that order and
//! returns a fresh [`Insights`] value. Nothing is cached between calls.

use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::AnalysisConfig,
    filter::segment_registered,
    matrix::{EngagementMatrix, engagement_matrix},
    schema::Dataset,
    stats::{
        Histogram, Metrics, ResolvedColumns, completions, compute_metrics, normalized_values,
        resolve_columns,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionKind {
    /// Rows were restricted to registered users.
    Segmentation,
    /// The column at the progress position stood in for a progress column.
    ProgressFallback,
    /// The last column stood in for a duration column.
    DurationFallback,
    MissingProgress,
    MissingDuration,
}

impl CorrectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionKind::Segmentation => "segmentation",
            CorrectionKind::ProgressFallback => "progress-fallback",
            CorrectionKind::DurationFallback => "duration-fallback",
            CorrectionKind::MissingProgress => "missing-progress",
            CorrectionKind::MissingDuration => "missing-duration",
        }
    }

    /// Omissions leave part of the analysis empty; the rest are substitutions.
    pub fn is_omission(&self) -> bool {
        matches!(
            self,
            CorrectionKind::MissingProgress | CorrectionKind::MissingDuration
        )
    }
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub kind: CorrectionKind,
    pub detail: String,
}

impl Correction {
    pub fn new(kind: CorrectionKind, detail: String) -> Self {
        Self { kind, detail }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub unregistered: usize,
    pub low_progress: usize,
}

impl Summary {
    /// Share of `count` in the whole file, 0 for an empty file.
    pub fn share_of_total(&self, count: usize) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            count as f64 / self.total_rows as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Valid rows as dataset row indices, in file order.
    pub filtered_rows: Vec<usize>,
    /// Subset of `filtered_rows` at 100% progress or more.
    pub completions: Vec<usize>,
    pub histogram: Histogram,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_matrix: Option<EngagementMatrix>,
    pub metrics: Metrics,
    pub corrections: Vec<Correction>,
    pub columns: ResolvedColumns,
    pub summary: Summary,
}

pub fn analyze(dataset: &Dataset, config: &AnalysisConfig) -> Insights {
    let mut corrections = Vec::new();

    let segmentation = segment_registered(dataset, &config.registration_tokens);
    corrections.extend(segmentation.correction);
    let filtered_rows = segmentation.rows;

    let (columns, resolution_notes) = resolve_columns(dataset, &config.classifier_options());
    corrections.extend(resolution_notes);

    let progress = columns.progress(dataset);
    let duration = columns.duration(dataset);

    let completions = completions(dataset, &filtered_rows, progress);
    let histogram = Histogram::from_values(&normalized_values(dataset, &filtered_rows, progress));
    let metrics = compute_metrics(dataset, &filtered_rows, &columns);
    let engagement_matrix = engagement_matrix(dataset, &filtered_rows, progress, duration);

    for correction in &corrections {
        if correction.kind.is_omission() {
            warn!("{}", correction.detail);
        } else {
            info!("{}", correction.detail);
        }
    }

    let summary = Summary {
        total_rows: dataset.row_count(),
        valid_rows: filtered_rows.len(),
        unregistered: dataset.row_count() - filtered_rows.len(),
        low_progress: histogram.low_progress_count(),
    };
    info!(
        "Analyzed {} row(s): {} valid, {} completion(s)",
        summary.total_rows,
        summary.valid_rows,
        completions.len()
    );

    Insights {
        filtered_rows,
        completions,
        histogram,
        engagement_matrix,
        metrics,
        corrections,
        columns,
        summary,
    }
}
