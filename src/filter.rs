//! Registration-status segmentation.
//!
//! The valid subset is every row whose registration column holds a truthy
//! token. Datasets without such a column are not segmented.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    insights::{Correction, CorrectionKind},
    schema::{Column, Dataset},
};

pub const DEFAULT_REGISTRATION_TOKENS: &[&str] = &["sí", "si", "yes", "true", "registrado"];

static REGISTRATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(registrado|registered|inscrito|enrolled|estado|status)")
        .expect("valid registration pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Indices of the kept rows, in dataset order.
    pub rows: Vec<usize>,
    pub correction: Option<Correction>,
}

pub fn registration_column(dataset: &Dataset) -> Option<&Column> {
    dataset
        .columns()
        .iter()
        .find(|column| REGISTRATION_PATTERN.is_match(&column.name.to_lowercase()))
}

pub fn is_registered(raw: &str, tokens: &[String]) -> bool {
    let lowered = raw.trim().to_lowercase();
    tokens.iter().any(|token| token.to_lowercase() == lowered)
}

pub fn segment_registered(dataset: &Dataset, tokens: &[String]) -> Segmentation {
    let Some(column) = registration_column(dataset) else {
        return Segmentation {
            rows: (0..dataset.row_count()).collect(),
            correction: None,
        };
    };
    let rows = dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| is_registered(row.text(column.index), tokens))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    let correction = Correction::new(
        CorrectionKind::Segmentation,
        format!(
            "Segmentation: {} registered users (column '{}')",
            rows.len(),
            column.name
        ),
    );
    Segmentation {
        rows,
        correction: Some(correction),
    }
}
