use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Interpret survey and course-progress CSV exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify columns, segment registered users and report progress insights
    Analyze(AnalyzeArgs),
    /// List every column with its inferred type
    Columns(ColumnsArgs),
    /// Preview the first few normalized rows in a formatted table
    Preview(PreviewArgs),
    /// Write the row dump, metrics report and/or completions list as CSV
    Export(ExportArgs),
    /// Print the analyst prompt built from the dataset
    Prompt(PromptArgs),
}

/// Input flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML analysis profile overriding the heuristics' defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the full insights as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Only show rows of registered users
    #[arg(long = "valid-only")]
    pub valid_only: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Directory receiving all three exports under dated file names
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,
    /// Destination of the row dump
    #[arg(long)]
    pub rows: Option<PathBuf>,
    /// Destination of the category/metric/value report
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Destination of the list of users at 100% progress
    #[arg(long)]
    pub completions: Option<PathBuf>,
    /// Restrict the row dump to registered users
    #[arg(long = "valid-only")]
    pub valid_only: bool,
    /// Leave the engagement matrix out of the report
    #[arg(long = "no-matrix")]
    pub no_matrix: bool,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output files (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of valid rows embedded in the prompt (defaults to the profile's value)
    #[arg(long = "sample-rows")]
    pub sample_rows: Option<usize>,
    /// Emit the prompt context as JSON instead of the rendered prompt
    #[arg(long)]
    pub json: bool,
    /// Write the prompt to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
