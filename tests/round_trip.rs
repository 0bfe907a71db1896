mod common;

use common::{SURVEY, TestWorkspace, analyze_default, fixture_path};
use csv_insights::{
    config::AnalysisConfig,
    ingest::load_dataset,
    io_utils,
    report::write_row_dump,
    schema::ColumnType,
};
use encoding_rs::{UTF_8, WINDOWS_1252};

// Holds for this fixture only. CATEGORICAL needs fewer distinct values than
// `row_count * categorical_ratio`, so reloading a smaller filtered subset can
// turn a CATEGORICAL column into TEXT. The fixture has no CATEGORICAL column
// before or after filtering.
#[test]
fn exported_rows_reload_with_the_same_column_types() {
    let options = AnalysisConfig::default().classifier_options();
    let original =
        load_dataset(&fixture_path(SURVEY), b',', UTF_8, &options).expect("load fixture");
    let insights = analyze_default(&original);

    let workspace = TestWorkspace::new();
    let dump = workspace.path().join("rows.csv");
    let mut writer = io_utils::csv_buffer(b',');
    write_row_dump(&mut writer, &original, Some(&insights.filtered_rows)).expect("dump");
    io_utils::write_csv_output(writer, &dump, UTF_8).expect("write dump");

    let reloaded = load_dataset(&dump, b',', UTF_8, &options).expect("reload dump");
    assert_eq!(reloaded.row_count(), insights.filtered_rows.len());
    assert_eq!(reloaded.headers(), original.headers());
    for (before, after) in original.columns().iter().zip(reloaded.columns()) {
        if before.column_type != ColumnType::Unknown {
            assert_eq!(
                before.column_type, after.column_type,
                "column '{}' changed type",
                before.name
            );
        }
    }
}

#[test]
fn windows_1252_dump_round_trips_accents() {
    let options = AnalysisConfig::default().classifier_options();
    let original =
        load_dataset(&fixture_path(SURVEY), b',', UTF_8, &options).expect("load fixture");

    let workspace = TestWorkspace::new();
    let dump = workspace.path().join("rows.csv");
    let mut writer = io_utils::csv_buffer(b';');
    write_row_dump(&mut writer, &original, None).expect("dump");
    io_utils::write_csv_output(writer, &dump, WINDOWS_1252).expect("write dump");

    let reloaded = load_dataset(&dump, b';', WINDOWS_1252, &options).expect("reload dump");
    assert_eq!(reloaded.row_count(), original.row_count());
    assert_eq!(reloaded.columns()[7].name, "duración (minutos)");
    assert_eq!(reloaded.rows()[4].get(2).as_display(), "Díaz");
}
