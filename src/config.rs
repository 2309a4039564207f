//! Tunables for dialect detection and type inference.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::{InferenceError, InferenceResult},
    number::{DecimalDialect, NumberFormat},
};

pub const DEFAULT_PREFERRED_SEPARATORS: &str = ",;|\t";
/// Lines sampled by the dialect detector.
pub const DEFAULT_SAMPLE_LINES: usize = 21;
/// Longest digit string still treated as an integer; longer identifiers
/// (account numbers, barcodes) stay text.
pub const DEFAULT_MAX_INTEGER_DIGIT_LENGTH: usize = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceOptions {
    /// Candidate separators favoured by the scorer. `\t` may be written as
    /// the two-character escape.
    pub preferred_separators: String,
    pub sample_lines: usize,
    pub allow_leading_zero_integers: bool,
    pub max_integer_digit_length: usize,
    pub decimal_dialects: DecimalDialect,
    /// Notation backing [`DecimalDialect::LOCALE_DECIMAL`].
    pub locale: Option<NumberFormat>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            preferred_separators: DEFAULT_PREFERRED_SEPARATORS.to_string(),
            sample_lines: DEFAULT_SAMPLE_LINES,
            allow_leading_zero_integers: false,
            max_integer_digit_length: DEFAULT_MAX_INTEGER_DIGIT_LENGTH,
            decimal_dialects: DecimalDialect::ANY,
            locale: None,
        }
    }
}

impl InferenceOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let options: InferenceOptions =
            serde_yaml::from_reader(reader).with_context(|| format!("Parsing config {path:?}"))?;
        options
            .validate()
            .with_context(|| format!("Validating config {path:?}"))?;
        Ok(options)
    }

    pub fn validate(&self) -> InferenceResult<()> {
        if self.preferred_separators().is_empty() {
            return Err(InferenceError::InvalidConfig(
                "preferred_separators must list at least one character".to_string(),
            ));
        }
        if self.sample_lines == 0 {
            return Err(InferenceError::InvalidConfig(
                "sample_lines must be greater than zero".to_string(),
            ));
        }
        if self.max_integer_digit_length == 0 {
            return Err(InferenceError::InvalidConfig(
                "max_integer_digit_length must be greater than zero".to_string(),
            ));
        }
        if let Some(locale) = &self.locale
            && locale.group_separator == Some(locale.decimal_separator)
        {
            return Err(InferenceError::InvalidConfig(format!(
                "locale decimal and group separators are both '{}'",
                locale.decimal_separator
            )));
        }
        Ok(())
    }

    /// Preferred separators with the `\t` escape expanded.
    pub fn preferred_separators(&self) -> Vec<char> {
        let expanded = self.preferred_separators.replace("\\t", "\t");
        let mut separators: Vec<char> = Vec::with_capacity(expanded.len());
        for ch in expanded.chars() {
            if !separators.contains(&ch) {
                separators.push(ch);
            }
        }
        separators
    }
}
