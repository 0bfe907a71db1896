//! Plain-text tables for the console commands.
//!
//! Columns whose cells are all numeric (a trailing `%` is allowed) are
//! right-aligned; everything else is left-aligned. Widths count characters,
//! not bytes, so accented headers line up.

use std::{borrow::Cow, fmt::Write as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut aligns = vec![Align::Right; column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            if !is_numeric_cell(cell) {
                aligns[idx] = Align::Left;
            }
        }
    }
    if rows.is_empty() {
        aligns.fill(Align::Left);
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &aligns));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &aligns));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Prints `title` underlined, then the table.
pub fn print_section(title: &str, headers: &[String], rows: &[Vec<String>]) {
    println!("{title}");
    println!("{}", "=".repeat(display_width(title)));
    print_table(headers, rows);
    println!();
}

pub fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut line = values
        .iter()
        .zip(widths.iter().zip(aligns))
        .map(|(value, (&width, &align))| {
            let cell = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&cell)));
            match align {
                Align::Left => format!("{cell}{padding}"),
                Align::Right => format!("{padding}{cell}"),
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn is_numeric_cell(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.trim_end_matches('%').parse::<f64>().is_ok()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
