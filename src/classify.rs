//! Semantic column classification.
//!
//! Classification is an ordered table of [`ClassificationRule`]s; the first
//! rule whose predicate holds decides the [`ColumnType`]. The positional rules
//! encode the layout of the survey tool's export (progress in column F,
//! duration in the last column) and are kept separate from the keyword rules
//! so [`ClassifierOptions::positional_fallbacks`] can switch them off.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, parse_numeric},
    schema::ColumnType,
};

pub const DEFAULT_PROGRESS_INDEX: usize = 5;
pub const DEFAULT_CATEGORICAL_RATIO: f64 = 0.2;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(dni|id|documento|codigo|cédula|cedula|rut|identificación|identificacion|matrícula|matricula)\b",
    )
    .expect("valid identifier pattern")
});

static PROGRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(%|progreso|resultado|avance|nota|puntaje|score|completion|completitud)")
        .expect("valid progress pattern")
});

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(minutos|duración|duracion|tiempo|horas|segundos|time|duration|spent|mínimo|maximo)",
    )
    .expect("valid duration pattern")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOptions {
    pub positional_fallbacks: bool,
    pub progress_index: usize,
    pub categorical_ratio: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            positional_fallbacks: true,
            progress_index: DEFAULT_PROGRESS_INDEX,
            categorical_ratio: DEFAULT_CATEGORICAL_RATIO,
        }
    }
}

/// Everything a rule may look at for one column.
pub struct ColumnEvidence<'a> {
    pub name: String,
    pub values: &'a [Value],
    pub index: usize,
    pub total_columns: usize,
    pub options: &'a ClassifierOptions,
}

impl<'a> ColumnEvidence<'a> {
    pub fn new(
        name: &str,
        values: &'a [Value],
        index: usize,
        total_columns: usize,
        options: &'a ClassifierOptions,
    ) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            values,
            index,
            total_columns,
            options,
        }
    }

    fn has_numeric_sample(&self) -> bool {
        self.values.iter().any(|v| parse_numeric(v).is_some())
    }

    fn is_last(&self) -> bool {
        self.total_columns > 0 && self.index == self.total_columns - 1
    }

    fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }
}

pub struct ClassificationRule {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub applies: fn(&ColumnEvidence<'_>) -> bool,
}

/// Precedence order; earlier rules win.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "identifier-keyword",
        column_type: ColumnType::Identifier,
        applies: identifier_keyword,
    },
    ClassificationRule {
        name: "progress-keyword",
        column_type: ColumnType::Percentage,
        applies: progress_keyword,
    },
    ClassificationRule {
        name: "progress-position",
        column_type: ColumnType::Percentage,
        applies: progress_position,
    },
    ClassificationRule {
        name: "duration-keyword",
        column_type: ColumnType::Duration,
        applies: duration_keyword,
    },
    ClassificationRule {
        name: "duration-position",
        column_type: ColumnType::Duration,
        applies: duration_position,
    },
    ClassificationRule {
        name: "no-values",
        column_type: ColumnType::Unknown,
        applies: no_values,
    },
    ClassificationRule {
        name: "low-cardinality-text",
        column_type: ColumnType::Categorical,
        applies: low_cardinality_text,
    },
    ClassificationRule {
        name: "numeric-sample",
        column_type: ColumnType::Metric,
        applies: numeric_sample,
    },
    ClassificationRule {
        name: "fallback",
        column_type: ColumnType::Text,
        applies: always,
    },
];

pub fn classify(name: &str, values: &[Value], index: usize, total_columns: usize) -> ColumnType {
    classify_with(
        name,
        values,
        index,
        total_columns,
        &ClassifierOptions::default(),
    )
}

pub fn classify_with(
    name: &str,
    values: &[Value],
    index: usize,
    total_columns: usize,
    options: &ClassifierOptions,
) -> ColumnType {
    let evidence = ColumnEvidence::new(name, values, index, total_columns, options);
    matching_rule(&evidence).column_type
}

/// The rule that decides the column; the table ends in a catch-all.
pub fn matching_rule(evidence: &ColumnEvidence<'_>) -> &'static ClassificationRule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(evidence))
        .unwrap_or(&RULES[RULES.len() - 1])
}

fn identifier_keyword(evidence: &ColumnEvidence<'_>) -> bool {
    IDENTIFIER_PATTERN.is_match(&evidence.name)
}

fn progress_keyword(evidence: &ColumnEvidence<'_>) -> bool {
    (evidence.name == "f" || PROGRESS_PATTERN.is_match(&evidence.name))
        && evidence.has_numeric_sample()
}

fn progress_position(evidence: &ColumnEvidence<'_>) -> bool {
    evidence.options.positional_fallbacks
        && evidence.index == evidence.options.progress_index
        && evidence.has_numeric_sample()
}

fn duration_keyword(evidence: &ColumnEvidence<'_>) -> bool {
    DURATION_PATTERN.is_match(&evidence.name) && evidence.has_numeric_sample()
}

fn duration_position(evidence: &ColumnEvidence<'_>) -> bool {
    evidence.options.positional_fallbacks && evidence.is_last() && evidence.has_numeric_sample()
}

fn no_values(evidence: &ColumnEvidence<'_>) -> bool {
    evidence.values.iter().all(Value::is_empty)
}

fn low_cardinality_text(evidence: &ColumnEvidence<'_>) -> bool {
    if !evidence.first_value().is_some_and(Value::is_text) {
        return false;
    }
    let distinct = evidence
        .values
        .iter()
        .filter_map(Value::distinct_key)
        .unique()
        .count();
    (distinct as f64) < evidence.values.len() as f64 * evidence.options.categorical_ratio
}

fn numeric_sample(evidence: &ColumnEvidence<'_>) -> bool {
    evidence
        .first_value()
        .is_some_and(Value::is_strictly_numeric)
}

fn always(_: &ColumnEvidence<'_>) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| crate::data::parse_cell(v)).collect()
    }

    #[test]
    fn identifier_keywords_win_over_numeric_values() {
        let values = texts(&["12345678", "87654321"]);
        assert_eq!(classify("DNI", &values, 5, 8), ColumnType::Identifier);
        assert_eq!(classify(" Cédula ", &values, 0, 8), ColumnType::Identifier);
        assert_eq!(classify("ID usuario", &values, 0, 8), ColumnType::Identifier);
    }

    #[test]
    fn identifier_keyword_requires_whole_word() {
        let values = texts(&["Lima", "Cusco"]);
        assert_ne!(classify("Ciudad", &values, 0, 3), ColumnType::Identifier);
    }

    #[test]
    fn progress_keyword_requires_numeric_sample() {
        assert_eq!(
            classify("Progreso", &texts(&["80%", "20%"]), 1, 4),
            ColumnType::Percentage
        );
        assert_ne!(
            classify("Comentario sobre progreso", &texts(&["bien", "mal"]), 1, 4),
            ColumnType::Percentage
        );
    }

    #[test]
    fn column_f_is_progress_by_position() {
        assert_eq!(
            classify("Columna", &texts(&["0.5", "1"]), 5, 8),
            ColumnType::Percentage
        );
        assert_eq!(classify("F", &texts(&["30"]), 2, 8), ColumnType::Percentage);
    }

    #[test]
    fn last_column_is_duration_by_position() {
        assert_eq!(
            classify("Columna", &texts(&["30", "12"]), 7, 8),
            ColumnType::Duration
        );
        assert_eq!(
            classify("Tiempo invertido", &texts(&["30 min"]), 2, 8),
            ColumnType::Duration
        );
    }

    #[test]
    fn progress_precedes_duration_when_both_match() {
        assert_eq!(
            classify("Nota", &texts(&["15"]), 3, 4),
            ColumnType::Percentage
        );
    }

    #[test]
    fn positional_rules_can_be_disabled() {
        let options = ClassifierOptions {
            positional_fallbacks: false,
            ..ClassifierOptions::default()
        };
        let values = texts(&["30", "12"]);
        assert_eq!(
            classify_with("Columna", &values, 5, 8, &options),
            ColumnType::Metric
        );
        assert_eq!(
            classify_with("Columna", &values, 7, 8, &options),
            ColumnType::Metric
        );
    }

    #[test]
    fn repetitive_text_is_categorical() {
        let mut values = Vec::new();
        for _ in 0..10 {
            values.push(Value::from("Lima"));
        }
        values.push(Value::from("Cusco"));
        assert_eq!(classify("Ciudad", &values, 1, 4), ColumnType::Categorical);
    }

    #[test]
    fn varied_text_is_text_and_numbers_are_metric() {
        let names = texts(&["Ana", "Luis", "Marta"]);
        assert_eq!(classify("Nombre", &names, 1, 4), ColumnType::Text);
        let ages = texts(&["21", "34", "29"]);
        assert_eq!(classify("Edad", &ages, 1, 4), ColumnType::Metric);
    }

    #[test]
    fn empty_columns_are_unknown() {
        let values = vec![Value::Empty, Value::Empty];
        assert_eq!(classify("Observaciones", &values, 1, 4), ColumnType::Unknown);
        assert_eq!(classify("Observaciones", &[], 1, 4), ColumnType::Unknown);
    }

    #[test]
    fn identifier_name_still_wins_on_empty_column() {
        assert_eq!(classify("id", &[], 0, 1), ColumnType::Identifier);
    }

    #[test]
    fn matching_rule_reports_rule_name() {
        let options = ClassifierOptions::default();
        let values = texts(&["10"]);
        let evidence = ColumnEvidence::new("Columna", &values, 5, 8, &options);
        assert_eq!(matching_rule(&evidence).name, "progress-position");
    }

    #[test]
    fn rule_table_ends_with_catch_all() {
        let last = RULES.last().expect("rules");
        assert_eq!(last.column_type, ColumnType::Text);
    }
}
