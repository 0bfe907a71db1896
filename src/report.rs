//! Tabular exports: the row dump, the flattened metrics report and the list
//! of users who completed the course.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use log::info;
use regex::Regex;
use serde::Serialize;

use crate::{
    cli::ExportArgs,
    data::format_number,
    ingest,
    insights::{Insights, analyze},
    io_utils,
    schema::{ColumnType, Dataset},
};

pub const SUMMARY_CATEGORY: &str = "EXECUTIVE SUMMARY";
pub const DISTRIBUTION_CATEGORY: &str = "PROGRESS DISTRIBUTION";
pub const MATRIX_CATEGORY: &str = "ENGAGEMENT MATRIX";

static FIRST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(nombre|first name|nombres)\b").expect("valid first name pattern")
});
static LAST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(apellido|last name|apellidos)\b").expect("valid last name pattern")
});

/// One `category,metric,value` line of the metrics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub category: &'static str,
    pub metric: String,
    pub value: String,
}

impl ReportLine {
    fn new(category: &'static str, metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            category,
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}

/// Headers followed by the source text of every row in `rows`, or of the
/// whole dataset when `rows` is `None`.
pub fn write_row_dump<W>(
    writer: &mut csv::Writer<W>,
    dataset: &Dataset,
    rows: Option<&[usize]>,
) -> Result<usize>
where
    W: Write,
{
    writer
        .write_record(dataset.headers())
        .context("Writing row dump headers")?;
    let selected: Box<dyn Iterator<Item = usize>> = match rows {
        Some(rows) => Box::new(rows.iter().copied()),
        None => Box::new(0..dataset.row_count()),
    };
    let mut written = 0usize;
    for idx in selected {
        let Some(row) = dataset.row(idx) else {
            continue;
        };
        writer
            .write_record(row.texts())
            .with_context(|| format!("Writing row {}", idx + 1))?;
        written += 1;
    }
    Ok(written)
}

pub fn metrics_report(dataset: &Dataset, insights: &Insights, include_matrix: bool) -> Vec<ReportLine> {
    let avg_progress = insights
        .metrics
        .avg_progress
        .map(|avg| format!("{avg:.2}%"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        ReportLine::new(SUMMARY_CATEGORY, "Total rows in file", dataset.row_count()),
        ReportLine::new(SUMMARY_CATEGORY, "Valid rows (segmented)", insights.summary.valid_rows),
        ReportLine::new(SUMMARY_CATEGORY, "Average progress", avg_progress),
        ReportLine::new(SUMMARY_CATEGORY, "Completions (100%)", insights.completions.len()),
    ];

    lines.extend(
        insights
            .histogram
            .buckets
            .iter()
            .map(|bucket| ReportLine::new(DISTRIBUTION_CATEGORY, bucket.range.as_str(), bucket.count)),
    );

    if include_matrix && let Some(matrix) = &insights.engagement_matrix {
        lines.extend(
            matrix
                .entries()
                .into_iter()
                .map(|(quadrant, count)| ReportLine::new(MATRIX_CATEGORY, quadrant.label(), count)),
        );
        lines.push(ReportLine::new(
            MATRIX_CATEGORY,
            "Median progress",
            format_number(matrix.medians.progress),
        ));
        lines.push(ReportLine::new(
            MATRIX_CATEGORY,
            "Median duration",
            format_number(matrix.medians.duration),
        ));
    }
    lines
}

pub fn write_metrics_report<W>(writer: &mut csv::Writer<W>, lines: &[ReportLine]) -> Result<()>
where
    W: Write,
{
    for line in lines {
        writer
            .serialize(line)
            .with_context(|| format!("Writing report line '{}'", line.metric))?;
    }
    Ok(())
}

/// Columns named in the completions list, each only when detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionColumns {
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub identifier: Option<usize>,
}

impl CompletionColumns {
    pub fn detect(dataset: &Dataset) -> Self {
        let find = |pattern: &Regex| {
            dataset
                .columns()
                .iter()
                .find(|c| pattern.is_match(&c.name.to_lowercase()))
                .map(|c| c.index)
        };
        Self {
            first_name: find(&FIRST_NAME),
            last_name: find(&LAST_NAME),
            identifier: dataset.first_of_type(ColumnType::Identifier).map(|c| c.index),
        }
    }
}

pub fn completions_table(dataset: &Dataset, insights: &Insights) -> (Vec<String>, Vec<Vec<String>>) {
    let columns = CompletionColumns::detect(dataset);
    let mut headers = Vec::new();
    let mut picked = Vec::new();
    if let Some(idx) = columns.first_name {
        headers.push("first name".to_string());
        picked.push(idx);
    }
    if let Some(idx) = columns.last_name {
        headers.push("last name".to_string());
        picked.push(idx);
    }
    if let Some(idx) = columns.identifier {
        headers.push(dataset.columns()[idx].name.clone());
        picked.push(idx);
    }
    headers.push("progress".to_string());

    let rows = insights
        .completions
        .iter()
        .filter_map(|&idx| dataset.row(idx))
        .map(|row| {
            picked
                .iter()
                .map(|&col| row.text(col).to_string())
                .chain(std::iter::once("100%".to_string()))
                .collect()
        })
        .collect();
    (headers, rows)
}

/// Where each export goes. Explicit paths win over `--out-dir` defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTargets {
    pub rows: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub completions: Option<PathBuf>,
}

impl ExportTargets {
    pub fn resolve(args: &ExportArgs, date: NaiveDate) -> Result<Self> {
        let stamp = date.format("%Y-%m-%d");
        let pick = |explicit: &Option<PathBuf>, stem: &str| {
            explicit.clone().or_else(|| {
                args.out_dir
                    .as_deref()
                    .map(|dir| dir.join(format!("{stem}_{stamp}.csv")))
            })
        };
        let targets = ExportTargets {
            rows: pick(&args.rows, "rows"),
            report: pick(&args.report, "metrics"),
            completions: pick(&args.completions, "completions"),
        };
        if targets == ExportTargets::default() {
            bail!("Nothing to export: pass --out-dir or at least one of --rows, --report, --completions");
        }
        Ok(targets)
    }
}

pub fn execute(args: &ExportArgs) -> Result<()> {
    let (config, dataset) = ingest::load_input(&args.input)?;
    let insights = analyze(&dataset, &config);
    let targets = ExportTargets::resolve(args, Local::now().date_naive())?;

    let input_delimiter =
        io_utils::resolve_input_delimiter(&args.input.input, args.input.delimiter);
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let delimiter_for =
        |path: &Path| io_utils::resolve_output_delimiter(path, args.output_delimiter, input_delimiter);

    if let Some(path) = &targets.rows {
        let mut writer = io_utils::csv_buffer(delimiter_for(path));
        let subset = args.valid_only.then_some(insights.filtered_rows.as_slice());
        let written = write_row_dump(&mut writer, &dataset, subset)?;
        io_utils::write_csv_output(writer, path, encoding)
            .with_context(|| format!("Writing row dump to {path:?}"))?;
        info!("Wrote {written} row(s) to {path:?}");
    }

    if let Some(path) = &targets.report {
        let lines = metrics_report(&dataset, &insights, !args.no_matrix);
        let mut writer = io_utils::csv_buffer(delimiter_for(path));
        write_metrics_report(&mut writer, &lines)?;
        io_utils::write_csv_output(writer, path, encoding)
            .with_context(|| format!("Writing metrics report to {path:?}"))?;
        info!("Wrote {} report line(s) to {path:?}", lines.len());
    }

    if let Some(path) = &targets.completions {
        let (headers, rows) = completions_table(&dataset, &insights);
        let mut writer = io_utils::csv_buffer(delimiter_for(path));
        writer
            .write_record(&headers)
            .context("Writing completions headers")?;
        for row in &rows {
            writer.write_record(row).context("Writing completion row")?;
        }
        io_utils::write_csv_output(writer, path, encoding)
            .with_context(|| format!("Writing completions list to {path:?}"))?;
        info!("Wrote {} completion(s) to {path:?}", rows.len());
    }
    Ok(())
}
