//! Analysis profile loaded from YAML.
//!
//! Every field is optional in the file; missing fields keep their defaults.
//!
//! ```yaml
//! positional_fallbacks: true
//! progress_index: 5
//! categorical_ratio: 0.2
//! registration_tokens: [sí, si, yes, true, registrado]
//! prompt_sample_rows: 20
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    classify::{ClassifierOptions, DEFAULT_CATEGORICAL_RATIO, DEFAULT_PROGRESS_INDEX},
    filter::DEFAULT_REGISTRATION_TOKENS,
};

pub const DEFAULT_PROMPT_SAMPLE_ROWS: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("categorical_ratio must be within (0, 1], got {0}")]
    CategoricalRatio(f64),
    #[error("registration_tokens must contain at least one non-blank token")]
    NoRegistrationTokens,
    #[error("prompt_sample_rows must be at least 1")]
    PromptSampleRows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub positional_fallbacks: bool,
    pub progress_index: usize,
    pub categorical_ratio: f64,
    pub registration_tokens: Vec<String>,
    pub prompt_sample_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            positional_fallbacks: true,
            progress_index: DEFAULT_PROGRESS_INDEX,
            categorical_ratio: DEFAULT_CATEGORICAL_RATIO,
            registration_tokens: DEFAULT_REGISTRATION_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect(),
            prompt_sample_rows: DEFAULT_PROMPT_SAMPLE_ROWS,
        }
    }
}

impl AnalysisConfig {
    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            positional_fallbacks: self.positional_fallbacks,
            progress_index: self.progress_index,
            categorical_ratio: self.categorical_ratio,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.categorical_ratio > 0.0 && self.categorical_ratio <= 1.0) {
            return Err(ConfigError::CategoricalRatio(self.categorical_ratio));
        }
        if self.registration_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::NoRegistrationTokens);
        }
        if self.prompt_sample_rows == 0 {
            return Err(ConfigError::PromptSampleRows);
        }
        Ok(())
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: AnalysisConfig =
            serde_yaml::from_str(input).context("Parsing analysis config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: AnalysisConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Validating config file {path:?}"))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
