//! Effort-versus-achievement segmentation.
//!
//! Every valid row is placed in one quadrant by comparing its normalized
//! progress and duration against the population medians. Rows at the
//! duration median count as low effort.

use serde::{Deserialize, Serialize};

use crate::{
    schema::{Column, Dataset},
    stats::{median, normalized_value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    /// High achievement, low effort.
    Stars,
    /// High achievement, high effort.
    Persisters,
    /// Low achievement, low effort.
    Disconnected,
    /// Low achievement, high effort.
    AtRisk,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::Stars => "Stars (high efficiency)",
            Quadrant::Persisters => "Persisters (high effort)",
            Quadrant::Disconnected => "Disconnected",
            Quadrant::AtRisk => "At risk (critical focus)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Medians {
    pub progress: f64,
    pub duration: f64,
}

impl Medians {
    pub fn quadrant(&self, progress: f64, duration: f64) -> Quadrant {
        match (progress >= self.progress, duration <= self.duration) {
            (true, true) => Quadrant::Stars,
            (true, false) => Quadrant::Persisters,
            (false, true) => Quadrant::Disconnected,
            (false, false) => Quadrant::AtRisk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMatrix {
    pub stars: usize,
    pub persisters: usize,
    pub disconnected: usize,
    pub at_risk: usize,
    pub medians: Medians,
}

impl EngagementMatrix {
    pub fn total(&self) -> usize {
        self.stars + self.persisters + self.disconnected + self.at_risk
    }

    /// Quadrants in reporting order with their counts.
    pub fn entries(&self) -> [(Quadrant, usize); 4] {
        [
            (Quadrant::Stars, self.stars),
            (Quadrant::Persisters, self.persisters),
            (Quadrant::Disconnected, self.disconnected),
            (Quadrant::AtRisk, self.at_risk),
        ]
    }
}

/// Builds the matrix over `rows`; `None` unless both columns are resolved.
pub fn engagement_matrix(
    dataset: &Dataset,
    rows: &[usize],
    progress: Option<&Column>,
    duration: Option<&Column>,
) -> Option<EngagementMatrix> {
    let (progress, duration) = (progress?, duration?);
    let points = rows
        .iter()
        .filter_map(|&idx| dataset.row(idx))
        .map(|row| {
            (
                normalized_value(row, Some(progress)),
                normalized_value(row, Some(duration)),
            )
        })
        .collect::<Vec<_>>();

    let medians = Medians {
        progress: median(&points.iter().map(|(p, _)| *p).collect::<Vec<_>>()),
        duration: median(&points.iter().map(|(_, d)| *d).collect::<Vec<_>>()),
    };

    let mut matrix = EngagementMatrix {
        stars: 0,
        persisters: 0,
        disconnected: 0,
        at_risk: 0,
        medians,
    };
    for (p, d) in points {
        match medians.quadrant(p, d) {
            Quadrant::Stars => matrix.stars += 1,
            Quadrant::Persisters => matrix.persisters += 1,
            Quadrant::Disconnected => matrix.disconnected += 1,
            Quadrant::AtRisk => matrix.at_risk += 1,
        }
    }
    Some(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify::ClassifierOptions, data::parse_cell};

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        let headers = vec!["progreso".to_string(), "minutos".to_string()];
        let records = rows
            .iter()
            .map(|(p, d)| vec![parse_cell(p), parse_cell(d)])
            .collect();
        Dataset::from_records(&headers, records, &ClassifierOptions::default())
    }

    fn build(data: &Dataset) -> Option<EngagementMatrix> {
        let rows = (0..data.row_count()).collect::<Vec<_>>();
        engagement_matrix(data, &rows, data.columns().first(), data.columns().get(1))
    }

    #[test]
    fn quadrant_table_matches_comparisons() {
        let medians = Medians {
            progress: 50.0,
            duration: 30.0,
        };
        assert_eq!(medians.quadrant(80.0, 10.0), Quadrant::Stars);
        assert_eq!(medians.quadrant(80.0, 60.0), Quadrant::Persisters);
        assert_eq!(medians.quadrant(20.0, 10.0), Quadrant::Disconnected);
        assert_eq!(medians.quadrant(20.0, 60.0), Quadrant::AtRisk);
    }

    #[test]
    fn duration_ties_go_to_low_effort_side() {
        let medians = Medians {
            progress: 50.0,
            duration: 30.0,
        };
        assert_eq!(medians.quadrant(50.0, 30.0), Quadrant::Stars);
        assert_eq!(medians.quadrant(49.0, 30.0), Quadrant::Disconnected);
    }

    #[test]
    fn segments_four_distinct_rows() {
        let data = dataset(&[("100", "10"), ("90", "90"), ("10", "5"), ("20", "80")]);
        let matrix = build(&data).expect("matrix");
        assert_eq!(matrix.medians.progress, 55.0);
        assert_eq!(matrix.medians.duration, 45.0);
        assert_eq!(
            (matrix.stars, matrix.persisters, matrix.disconnected, matrix.at_risk),
            (1, 1, 1, 1)
        );
        assert_eq!(matrix.total(), 4);
    }

    #[test]
    fn identical_rows_are_all_stars() {
        let data = dataset(&[("60", "20"); 4]);
        let matrix = build(&data).expect("matrix");
        assert_eq!(matrix.stars, 4);
        assert_eq!(matrix.persisters + matrix.at_risk, 0);
    }

    #[test]
    fn missing_duration_means_no_matrix() {
        let data = dataset(&[("60", "20")]);
        let rows = vec![0];
        assert!(engagement_matrix(&data, &rows, data.columns().first(), None).is_none());
        assert!(engagement_matrix(&data, &rows, None, data.columns().get(1)).is_none());
    }

    #[test]
    fn empty_subset_yields_zero_medians() {
        let data = dataset(&[("60", "20")]);
        let matrix = engagement_matrix(&data, &[], data.columns().first(), data.columns().get(1))
            .expect("matrix");
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.medians.progress, 0.0);
        assert_eq!(matrix.medians.duration, 0.0);
    }
}
