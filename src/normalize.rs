//! Repair of UTF-8 text that was decoded as a single-byte encoding.
//!
//! Survey exports frequently pass through a Latin-1/Windows-1252 round trip,
//! leaving `Ã©` where `é` belongs. [`normalize()`] rewrites the known
//! sequences back to their accented characters. Rules are applied in order:
//! whole words and two-character sequences come first, the bare lead byte
//! `Ã` (continuation byte lost) comes last.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

use crate::data::Value;

static DURACION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)duraciÃ³n").expect("valid duration pattern"));
static TELEFONO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)telÃ©fono").expect("valid phone pattern"));

const SEQUENCE_RULES: &[(&str, &str)] = &[
    ("SÃ\u{ad}", "Sí"),
    ("Ã©", "é"),
    ("Ã³", "ó"),
    ("Ã±", "ñ"),
    ("Ã¡", "á"),
    ("Ãº", "ú"),
    ("Ã¼", "ü"),
    ("Ã\u{ad}", "í"),
    ("Ã", "í"),
];

/// Rewrites mis-encoded sequences; borrows the input when nothing matches.
pub fn normalize(input: &str) -> Cow<'_, str> {
    if !input.contains('Ã') {
        return Cow::Borrowed(input);
    }
    let mut text = DURACION_PATTERN
        .replace_all(input, "duración")
        .into_owned();
    text = TELEFONO_PATTERN.replace_all(&text, "teléfono").into_owned();
    for (pattern, replacement) in SEQUENCE_RULES {
        if text.contains(pattern) {
            text = text.replace(pattern, replacement);
        }
    }
    Cow::Owned(text)
}

/// Normalizes text cells; numbers and empty cells pass through unchanged.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Text(text) => match normalize(&text) {
            Cow::Borrowed(_) => Value::Text(text),
            Cow::Owned(fixed) => Value::Text(fixed),
        },
        other => other,
    }
}
