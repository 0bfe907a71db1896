//! Context handed to a conversational analyst, and the system prompt that
//! wraps it.

use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    cli::PromptArgs,
    data::Value,
    ingest,
    insights::{Correction, Insights, analyze},
    io_utils,
    schema::{Dataset, Row},
    stats::{Bucket, Metrics},
};

const RULES: [&str; 4] = [
    "If the user asks for names or tables, answer with a clear, formatted response.",
    "If a column is IDENTIFIER (such as a national ID), NEVER compute averages over it.",
    "Prioritise what is actionable. Do not just state the number, say what it means.",
    "If the question cannot be answered from the data, say so honestly.",
];

/// One row serialized as an object keyed by column name, in column order.
/// Cells keep their source text; empty cells become `null`.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    dataset: &'a Dataset,
    row: &'a Row,
}

impl Serialize for RowView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let columns = self.dataset.columns();
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for column in columns {
            match self.row.get(column.index) {
                Value::Empty => map.serialize_entry(&column.name, &Value::Empty)?,
                _ => map.serialize_entry(&column.name, self.row.text(column.index))?,
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext<'a> {
    pub valid_rows: usize,
    /// `name (TYPE)` for every column.
    pub columns: Vec<String>,
    pub completions: usize,
    pub low_progress: usize,
    pub histogram: &'a [Bucket],
    pub metrics: &'a Metrics,
    pub corrections: &'a [Correction],
    pub sample: Vec<RowView<'a>>,
}

impl<'a> PromptContext<'a> {
    pub fn new(dataset: &'a Dataset, insights: &'a Insights, sample_rows: usize) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .map(|c| format!("{} ({})", c.name, c.column_type))
            .collect();
        let sample = insights
            .filtered_rows
            .iter()
            .take(sample_rows)
            .filter_map(|&idx| dataset.row(idx))
            .map(|row| RowView { dataset, row })
            .collect();
        Self {
            valid_rows: insights.summary.valid_rows,
            columns,
            completions: insights.completions.len(),
            low_progress: insights.summary.low_progress,
            histogram: &insights.histogram.buckets,
            metrics: &insights.metrics,
            corrections: &insights.corrections,
            sample,
        }
    }

    pub fn render(&self) -> Result<String> {
        let histogram =
            serde_json::to_string(self.histogram).context("Serializing histogram for prompt")?;
        let metrics =
            serde_json::to_string(self.metrics).context("Serializing metrics for prompt")?;
        let sample = serde_json::to_string(&self.sample).context("Serializing sample rows")?;
        let corrections = if self.corrections.is_empty() {
            "none".to_string()
        } else {
            self.corrections.iter().map(|c| c.detail.as_str()).join("; ")
        };
        let rules = RULES
            .iter()
            .enumerate()
            .map(|(idx, rule)| format!("{}. {rule}", idx + 1))
            .join("\n");

        Ok(format!(
            "You are a senior data analyst with business judgement.\n\
             Your answers must be professional, direct and based ONLY on the data provided.\n\
             \n\
             PROCESSED DATA:\n\
             - Clean records: {valid}\n\
             - Identified columns: {columns}\n\
             - Users at 100%: {completions}\n\
             - Users below 25%: {low}\n\
             - Distribution summary: {histogram}\n\
             - Extra metrics: {metrics}\n\
             - Corrections applied: {corrections}\n\
             \n\
             RULES:\n\
             {rules}\n\
             \n\
             DATA CONTEXT (first {shown} valid rows):\n\
             {sample}\n",
            valid = self.valid_rows,
            columns = self.columns.join(", "),
            completions = self.completions,
            low = self.low_progress,
            shown = self.sample.len(),
        ))
    }
}

pub fn execute(args: &PromptArgs) -> Result<()> {
    let (config, dataset) = ingest::load_input(&args.input)?;
    let insights = analyze(&dataset, &config);
    let sample_rows = args.sample_rows.unwrap_or(config.prompt_sample_rows);
    let context = PromptContext::new(&dataset, &insights, sample_rows);

    let text = if args.json {
        let mut json =
            serde_json::to_string_pretty(&context).context("Serializing prompt context")?;
        json.push('\n');
        json
    } else {
        context.render()?
    };
    let output = args.output.as_deref().unwrap_or(Path::new("-"));
    io_utils::write_text_output(&text, output, encoding_rs::UTF_8)?;
    info!(
        "Prompt built from {} valid row(s) with {} sample row(s)",
        context.valid_rows,
        context.sample.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, ingest::dataset_from_str};

    fn build(csv: &str) -> (Dataset, Insights) {
        let config = AnalysisConfig::default();
        let dataset =
            dataset_from_str(csv, b',', &config.classifier_options()).expect("dataset");
        let insights = analyze(&dataset, &config);
        (dataset, insights)
    }

    #[test]
    fn sample_rows_keep_column_order() {
        let (dataset, insights) = build("zeta,alpha,progreso\nb,a,50\n");
        let context = PromptContext::new(&dataset, &insights, 20);
        let json = serde_json::to_string(&context.sample).expect("json");
        assert_eq!(json, r#"[{"zeta":"b","alpha":"a","progreso":"50"}]"#);
    }

    #[test]
    fn sample_rows_keep_leading_zeros_and_null_empties() {
        let (dataset, insights) = build("dni,nombre,progreso\n01234567,,80.50\n");
        let context = PromptContext::new(&dataset, &insights, 20);
        let json = serde_json::to_string(&context.sample).expect("json");
        assert_eq!(json, r#"[{"dni":"01234567","nombre":null,"progreso":"80.50"}]"#);
    }

    #[test]
    fn sample_is_bounded_and_filtered() {
        let mut csv = String::from("status,progreso\n");
        for idx in 0..30 {
            let status = if idx % 3 == 0 { "no" } else { "yes" };
            csv.push_str(&format!("{status},{idx}\n"));
        }
        let (dataset, insights) = build(&csv);
        assert_eq!(insights.summary.valid_rows, 20);
        let context = PromptContext::new(&dataset, &insights, 5);
        assert_eq!(context.sample.len(), 5);
        let value = serde_json::to_value(&context).expect("json");
        assert_eq!(value["sample"][0]["status"], "yes");
        assert_eq!(value["validRows"], 20);
    }

    #[test]
    fn rendered_prompt_lists_columns_and_rules() {
        let (dataset, insights) = build("dni,progreso,minutos\n1,100,30\n2,10,5\n");
        let text = PromptContext::new(&dataset, &insights, 20)
            .render()
            .expect("render");
        assert!(text.contains("- Identified columns: dni (IDENTIFIER), progreso (PERCENTAGE), minutos (DURATION)"));
        assert!(text.contains("- Users at 100%: 1"));
        assert!(text.contains("- Users below 25%: 1"));
        assert!(text.contains("2. If a column is IDENTIFIER"));
        assert!(text.contains("- Corrections applied: none"));
        assert!(text.contains("DATA CONTEXT (first 2 valid rows)"));
    }
}
