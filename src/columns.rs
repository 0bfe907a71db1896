//! Column listing for a dataset.
//!
//! Renders every column's position, normalized name, raw header (when
//! normalization changed it), inferred type and first-row sample.

use anyhow::Result;
use log::info;

use crate::{cli::ColumnsArgs, ingest, schema::Dataset, table};

pub fn column_rows(dataset: &Dataset) -> Vec<Vec<String>> {
    let first = dataset.rows().first();
    dataset
        .columns()
        .iter()
        .map(|column| {
            let original = if column.original_name != column.name {
                column.original_name.clone()
            } else {
                String::new()
            };
            vec![
                (column.index + 1).to_string(),
                column.name.clone(),
                original,
                column.column_type.to_string(),
                first
                    .map(|row| row.text(column.index).to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect()
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let (_, dataset) = ingest::load_input(&args.input)?;
    let rows = column_rows(&dataset);
    table::print_table(
        &table::headers(&["#", "name", "original", "type", "sample"]),
        &rows,
    );
    info!(
        "Listed {} column(s) from {:?}",
        rows.len(),
        args.input.input
    );
    Ok(())
}
