use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell as handed over by the ingestion layer.
///
/// Serializes as a plain JSON scalar: text becomes a string, numbers stay
/// numbers and empty cells become `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Empty => String::new(),
        }
    }

    /// Key used when counting distinct values; numbers and text never collide.
    pub(crate) fn distinct_key(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(format!("t:{s}")),
            Value::Number(n) => Some(format!("n:{n}")),
            Value::Empty => None,
        }
    }

    /// True for numbers and for text that parses as a number without any
    /// stripping.
    pub fn is_strictly_numeric(&self) -> bool {
        match self {
            Value::Number(_) => true,
            Value::Text(s) => s.trim().parse::<f64>().is_ok(),
            Value::Empty => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

/// Converts a raw text cell into a scalar: blank cells are empty, strictly
/// numeric text becomes a number, everything else stays text.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && looks_like_plain_number(trimmed) => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

// `f64::from_str` also accepts "inf", "NaN" and friends.
fn looks_like_plain_number(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Lenient numeric extraction: every character other than a digit, `.` or `-`
/// is dropped before parsing.
///
/// This keeps "85%" and "12 min" usable but mis-reads a comma decimal
/// separator ("12,5" becomes 125) and yields nothing for ranges such as
/// "10-20". Both are known gaps kept for compatibility with existing exports.
pub fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Value::Text(s) => {
            let stripped = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect::<String>();
            if stripped.is_empty() {
                return None;
            }
            stripped.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        Value::Empty => None,
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
