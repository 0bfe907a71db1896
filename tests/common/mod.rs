#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_insights::{
    config::AnalysisConfig,
    data::parse_cell,
    insights::{Insights, analyze},
    schema::Dataset,
};
use tempfile::{TempDir, tempdir};

pub const SURVEY: &str = "survey.csv";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Builds a dataset from literal cells with the default profile.
pub fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
    let config = AnalysisConfig::default();
    let headers = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let records = rows
        .iter()
        .map(|row| row.iter().map(|cell| parse_cell(cell)).collect())
        .collect();
    Dataset::from_records(&headers, records, &config.classifier_options())
}

pub fn analyze_default(dataset: &Dataset) -> Insights {
    analyze(dataset, &AnalysisConfig::default())
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write temp file bytes");
        path
    }
}
