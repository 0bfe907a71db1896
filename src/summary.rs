//! Console rendering of an analysis run.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::AnalyzeArgs,
    data::format_number,
    ingest,
    insights::{Insights, analyze},
    schema::Dataset,
    table,
};

fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn correction_rows(insights: &Insights) -> Vec<Vec<String>> {
    insights
        .corrections
        .iter()
        .map(|c| vec![c.kind.to_string(), c.detail.clone()])
        .collect()
}

pub fn summary_rows(dataset: &Dataset, insights: &Insights) -> Vec<Vec<String>> {
    let summary = &insights.summary;
    let column_name = |idx: Option<usize>| {
        idx.and_then(|i| dataset.columns().get(i))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let mut rows = vec![
        vec!["total rows".to_string(), summary.total_rows.to_string(), String::new()],
        vec![
            "registered".to_string(),
            summary.valid_rows.to_string(),
            percent(summary.share_of_total(summary.valid_rows)),
        ],
        vec![
            "unregistered".to_string(),
            summary.unregistered.to_string(),
            percent(summary.share_of_total(summary.unregistered)),
        ],
        vec![
            "completions".to_string(),
            insights.completions.len().to_string(),
            String::new(),
        ],
        vec![
            "below 25%".to_string(),
            summary.low_progress.to_string(),
            String::new(),
        ],
        vec![
            "progress column".to_string(),
            column_name(insights.columns.progress),
            String::new(),
        ],
        vec![
            "duration column".to_string(),
            column_name(insights.columns.duration),
            String::new(),
        ],
    ];
    let metrics = &insights.metrics;
    if let Some(avg) = metrics.avg_progress {
        rows.push(vec!["avg progress".to_string(), format!("{avg:.2}"), String::new()]);
    }
    if let Some(avg) = metrics.avg_result {
        rows.push(vec!["avg result".to_string(), format!("{avg:.2}"), String::new()]);
    }
    rows.push(vec![
        "avg duration (100%)".to_string(),
        format!("{:.2}", metrics.avg_duration_high),
        String::new(),
    ]);
    rows.push(vec![
        "avg duration (<25%)".to_string(),
        format!("{:.2}", metrics.avg_duration_low),
        String::new(),
    ]);
    rows
}

pub fn histogram_rows(insights: &Insights) -> Vec<Vec<String>> {
    insights
        .histogram
        .buckets
        .iter()
        .map(|b| vec![b.range.clone(), b.count.to_string(), percent(b.percentage)])
        .collect()
}

pub fn matrix_rows(insights: &Insights) -> Option<Vec<Vec<String>>> {
    let matrix = insights.engagement_matrix.as_ref()?;
    let total = matrix.total();
    let mut rows = matrix
        .entries()
        .into_iter()
        .map(|(quadrant, count)| {
            let share = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            vec![quadrant.label().to_string(), count.to_string(), percent(share)]
        })
        .collect::<Vec<_>>();
    rows.push(vec![
        "median progress".to_string(),
        format_number(matrix.medians.progress),
        String::new(),
    ]);
    rows.push(vec![
        "median duration".to_string(),
        format_number(matrix.medians.duration),
        String::new(),
    ]);
    Some(rows)
}

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let (config, dataset) = ingest::load_input(&args.input)?;
    let insights = analyze(&dataset, &config);

    if args.json {
        let json = serde_json::to_string_pretty(&insights).context("Serializing insights")?;
        println!("{json}");
        return Ok(());
    }

    if !insights.corrections.is_empty() {
        table::print_section(
            "Corrections",
            &table::headers(&["kind", "detail"]),
            &correction_rows(&insights),
        );
    }
    table::print_section(
        "Summary",
        &table::headers(&["metric", "value", "share"]),
        &summary_rows(&dataset, &insights),
    );
    table::print_section(
        "Progress distribution",
        &table::headers(&["range", "users", "share"]),
        &histogram_rows(&insights),
    );
    match matrix_rows(&insights) {
        Some(rows) => table::print_section(
            "Engagement matrix",
            &table::headers(&["segment", "users", "share"]),
            &rows,
        ),
        None => info!("Engagement matrix unavailable without progress and duration columns"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, ingest::dataset_from_str};

    fn run(csv: &str) -> (Dataset, Insights) {
        let config = AnalysisConfig::default();
        let dataset =
            dataset_from_str(csv, b',', &config.classifier_options()).expect("dataset");
        let insights = analyze(&dataset, &config);
        (dataset, insights)
    }

    #[test]
    fn summary_reports_shares_and_resolved_columns() {
        let (dataset, insights) = run("estado,progreso,minutos\nsí,100,20\nno,0,5\nsí,50,40\nsí,10,60\n");
        let rows = summary_rows(&dataset, &insights);
        assert_eq!(rows[1], vec!["registered", "3", "75.0%"]);
        assert_eq!(rows[2], vec!["unregistered", "1", "25.0%"]);
        assert_eq!(rows[5][1], "progreso");
        assert_eq!(rows[6][1], "minutos");
        assert_eq!(histogram_rows(&insights)[0], vec!["0-24%", "1", "33.3%"]);
    }

    #[test]
    fn matrix_rows_absent_without_duration() {
        let (dataset, insights) = run("progreso\n40\n");
        assert!(matrix_rows(&insights).is_none());
        assert_eq!(summary_rows(&dataset, &insights)[6][1], "-");
    }

    #[test]
    fn matrix_rows_end_with_medians() {
        let (_, insights) = run("progreso,minutos\n100,10\n20,30\n");
        let rows = matrix_rows(&insights).expect("matrix");
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[4], vec!["median progress", "60", ""]);
        assert_eq!(rows[5], vec!["median duration", "20", ""]);
    }
}
