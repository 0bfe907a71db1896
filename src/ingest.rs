//! Loading CSV sources into a [`Dataset`].
//!
//! This is the only place where the analysis can fail: a missing or
//! undecodable file, or one without data rows, is reported as an error.
//! Everything past this point degrades gracefully.

use std::{io::Read, path::Path};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    classify::ClassifierOptions,
    cli::InputArgs,
    config::AnalysisConfig,
    io_utils,
    schema::Dataset,
};

#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn into_dataset(self, options: &ClassifierOptions) -> Dataset {
        Dataset::from_text_records(&self.headers, self.records, options)
    }
}

/// Reads every record from `reader`. Completely blank records are skipped.
pub fn read_table<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
    source: &str,
) -> Result<RawTable>
where
    R: Read,
{
    let headers = io_utils::reader_headers(reader, encoding)
        .with_context(|| format!("Reading headers from {source}"))?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        bail!("{source} has no header row");
    }

    let mut records = Vec::new();
    let mut blank = 0usize;
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {source}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {source}", idx + 2))?;
        if decoded.iter().all(|cell| cell.trim().is_empty()) {
            blank += 1;
            continue;
        }
        records.push(decoded);
    }
    if blank > 0 {
        debug!("Skipped {blank} blank row(s) in {source}");
    }
    if records.is_empty() {
        bail!("{source} contains no data rows");
    }
    Ok(RawTable { headers, records })
}

pub fn load_dataset(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    options: &ClassifierOptions,
) -> Result<Dataset> {
    let source = if io_utils::is_dash(path) {
        "stdin".to_string()
    } else {
        format!("{path:?}")
    };
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let table = read_table(&mut reader, encoding, &source)?;
    let dataset = table.into_dataset(options);
    info!(
        "Loaded {} row(s) across {} column(s) from {}",
        dataset.row_count(),
        dataset.columns().len(),
        source
    );
    Ok(dataset)
}

/// Loads the analysis profile and the dataset named by the shared input
/// flags of every subcommand.
pub fn load_input(args: &InputArgs) -> Result<(AnalysisConfig, Dataset)> {
    let config = AnalysisConfig::load_or_default(args.config.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = load_dataset(&args.input, delimiter, encoding, &config.classifier_options())
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    Ok((config, dataset))
}

/// Parses CSV text held in memory; used for tests and piping.
pub fn dataset_from_str(
    input: &str,
    delimiter: u8,
    options: &ClassifierOptions,
) -> Result<Dataset> {
    let mut reader = io_utils::open_csv_reader(input.as_bytes(), delimiter);
    let table = read_table(&mut reader, encoding_rs::UTF_8, "inline CSV")?;
    Ok(table.into_dataset(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, schema::ColumnType};

    #[test]
    fn reads_headers_and_typed_cells() {
        let csv = "Nombre,DuraciÃ³n\nAna,30\nLuis,\n";
        let dataset = dataset_from_str(csv, b',', &ClassifierOptions::default()).expect("dataset");
        assert_eq!(dataset.headers(), vec!["Nombre", "duración"]);
        assert_eq!(dataset.rows()[0].get(1), &Value::Number(30.0));
        assert_eq!(dataset.rows()[1].get(1), &Value::Empty);
        assert_eq!(dataset.columns()[1].column_type, ColumnType::Duration);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let csv = "a,b,c\n1\n1,2,3,4\n";
        let dataset = dataset_from_str(csv, b',', &ClassifierOptions::default()).expect("dataset");
        assert_eq!(dataset.row_count(), 2);
        assert!(dataset.rows().iter().all(|row| row.values().len() == 3));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "a,b\n1,2\n,\n3,4\n";
        let dataset = dataset_from_str(csv, b',', &ClassifierOptions::default()).expect("dataset");
        assert_eq!(dataset.row_count(), 2);
    }

    #[test]
    fn header_only_source_is_an_error() {
        let err = dataset_from_str("a,b\n", b',', &ClassifierOptions::default())
            .expect_err("no rows");
        assert!(err.to_string().contains("no data rows"));
        assert!(dataset_from_str("", b',', &ClassifierOptions::default()).is_err());
    }

    #[test]
    fn semicolon_delimited_input_is_supported() {
        let csv = "nombre;progreso\nAna;80%\n";
        let dataset = dataset_from_str(csv, b';', &ClassifierOptions::default()).expect("dataset");
        assert_eq!(dataset.columns()[1].column_type, ColumnType::Percentage);
    }
}
