use anyhow::Result;
use log::info;

use crate::{
    cli::PreviewArgs, filter::segment_registered, ingest, schema::Dataset, table,
};

/// Cell text of up to `limit` rows, optionally only registered ones.
pub fn preview_rows(
    dataset: &Dataset,
    tokens: &[String],
    valid_only: bool,
    limit: usize,
) -> Vec<Vec<String>> {
    let indices = if valid_only {
        segment_registered(dataset, tokens).rows
    } else {
        (0..dataset.row_count()).collect()
    };
    indices
        .into_iter()
        .take(limit)
        .filter_map(|idx| dataset.row(idx))
        .map(|row| row.texts().to_vec())
        .collect()
}

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let (config, dataset) = ingest::load_input(&args.input)?;
    let rows = preview_rows(
        &dataset,
        &config.registration_tokens,
        args.valid_only,
        args.rows,
    );
    table::print_table(&dataset.headers(), &rows);
    info!(
        "Displayed {} row(s) from {:?}",
        rows.len(),
        args.input.input
    );
    Ok(())
}
