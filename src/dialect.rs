//! Dialect model and detection.
//!
//! Detection runs the W3C log fast path first, then scores separator
//! candidates over a raw and a quote-aware character profile, and falls back
//! to fixed-width recognition when neither profile yields a separator.

use std::cmp::Ordering;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    config::InferenceOptions,
    fixed_width::detect_field_widths,
    frequency::FrequencyProfile,
    separator::{self, SeparatorGuess, choose_separator},
    w3c::detect_w3c,
};

/// Separator value of an undetermined dialect.
pub const UNDETERMINED: char = '\0';
/// Width of the final fixed-width field: the rest of the line.
pub const REST_OF_LINE: i32 = -1;
pub const DEFAULT_QUOTE: char = '"';

/// Lexical conventions needed to split raw text into fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dialect {
    pub separator: char,
    #[serde(default)]
    pub quote: Option<char>,
    #[serde(default)]
    pub comment: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_widths: Option<Vec<i32>>,
    #[serde(default)]
    pub has_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_names: Option<Vec<String>>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::undetermined()
    }
}

impl Dialect {
    /// The "ask the user" result: no separator and no field widths.
    pub fn undetermined() -> Self {
        Self {
            separator: UNDETERMINED,
            quote: Some(DEFAULT_QUOTE),
            comment: None,
            fixed_widths: None,
            has_header: None,
            field_names: None,
        }
    }

    pub fn delimited(separator: char, quote: Option<char>) -> Self {
        Self {
            separator,
            quote,
            ..Self::undetermined()
        }
    }

    pub fn fixed_width(widths: Vec<i32>) -> Self {
        Self {
            quote: None,
            fixed_widths: Some(widths),
            ..Self::undetermined()
        }
    }

    pub fn with_header(mut self, has_header: Option<bool>) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn is_fixed_width(&self) -> bool {
        self.fixed_widths.as_ref().is_some_and(|widths| !widths.is_empty())
    }

    pub fn is_determined(&self) -> bool {
        self.separator != UNDETERMINED || self.is_fixed_width()
    }
}

pub fn printable_separator(separator: char) -> String {
    match separator {
        UNDETERMINED => "<undetermined>".to_string(),
        '\t' => "\\t".to_string(),
        ' ' => "<space>".to_string(),
        other => other.to_string(),
    }
}

/// Guesses the dialect of `text` without any user-supplied schema.
pub fn detect(text: &str, options: &InferenceOptions) -> Dialect {
    if let Some(dialect) = detect_w3c(text) {
        return dialect;
    }

    let profile = FrequencyProfile::scan(text, options.sample_lines);
    if profile.line_count() == 0 {
        debug!("No non-blank lines to sample; dialect undetermined");
        return Dialect::undetermined();
    }

    let preferred = options.preferred_separators();
    let lines = profile.line_count();
    let raw = choose_separator(&profile.raw.statistics(), lines, &preferred);
    let quote_aware = choose_separator(&profile.quote_aware.statistics(), lines, &preferred);
    debug!(
        "Separator guesses over {lines} line(s): raw {} (uncertainty {}), quote-aware {} (uncertainty {})",
        describe(&raw),
        raw.uncertainty,
        describe(&quote_aware),
        quote_aware.uncertainty
    );

    let (separator, quote) = match separator::compare(&quote_aware, &raw) {
        Ordering::Less => (quote_aware.separator, Some(DEFAULT_QUOTE)),
        Ordering::Greater => (raw.separator, None),
        Ordering::Equal => (raw.separator, Some(DEFAULT_QUOTE)),
    };
    if let Some(separator) = separator {
        info!(
            "Detected separator '{}' (quoting {})",
            printable_separator(separator),
            if quote.is_some() { "on" } else { "off" }
        );
        return Dialect::delimited(separator, quote);
    }

    match detect_field_widths(&profile) {
        Some(widths) => {
            info!("Detected fixed-width layout with {} field(s)", widths.len());
            Dialect::fixed_width(widths)
        }
        None => {
            info!("Unable to determine the dialect; manual settings are required");
            Dialect::undetermined()
        }
    }
}

fn describe(guess: &SeparatorGuess) -> String {
    guess
        .separator
        .map(printable_separator)
        .unwrap_or_else(|| printable_separator(UNDETERMINED))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_default(text: &str) -> Dialect {
        detect(text, &InferenceOptions::default())
    }

    #[test]
    fn detects_comma_separated_table() {
        let text = "h1,h2,h3\n1,2,3\n4,5,6\n7,8,9\n10,11,12\n13,14,15\n";
        let dialect = detect_default(text);
        assert_eq!(dialect.separator, ',');
        assert_eq!(dialect.quote, Some('"'));
        assert!(dialect.is_determined());
        assert!(!dialect.is_fixed_width());
    }

    #[test]
    fn quoted_separators_favour_quote_aware_profile() {
        let text = "\
name;note
\"Smith; John\";ok
\"Doe; Jane\";\"late; twice\"
plain;fine
";
        let dialect = detect_default(text);
        assert_eq!(dialect.separator, ';');
        assert_eq!(dialect.quote, Some('"'));
    }

    #[test]
    fn stray_quote_turns_quoting_off() {
        // the unmatched quote hides every later comma from the quote-aware profile
        let dialect = detect_default("a,b,c\n5\",6,7\n8,9,10\n11,12,13\n");
        assert_eq!(dialect.separator, ',');
        assert_eq!(dialect.quote, None);
    }

    #[test]
    fn empty_input_is_undetermined() {
        let dialect = detect_default("");
        assert_eq!(dialect, Dialect::undetermined());
        assert!(!dialect.is_determined());
        assert!(!detect_default("\n\n  \n").is_determined());
    }

    #[test]
    fn single_ambiguous_line_takes_first_constant_separator() {
        // one line: every character has zero variance
        let dialect = detect_default("a;b,c;d");
        assert_eq!(dialect.separator, ';');

        let tied = detect_default("a|b,c");
        assert_eq!(tied.separator, ',');
    }

    #[test]
    fn falls_back_to_fixed_widths() {
        let text = "\
id    name      city
1     Alice     Oslo
22    Bob       Lima
";
        let dialect = detect_default(text);
        assert_eq!(dialect.separator, UNDETERMINED);
        assert_eq!(dialect.fixed_widths, Some(vec![6, 10, REST_OF_LINE]));
        assert_eq!(dialect.quote, None);
        assert!(dialect.is_determined());
    }

    #[test]
    fn w3c_logs_bypass_statistics() {
        let text = "#Version: 1.0\n#Fields: date time cs-uri\n2024-01-01 10:00:00 /a\n";
        let dialect = detect_default(text);
        assert_eq!(dialect.separator, ' ');
        assert_eq!(dialect.comment, Some('#'));
        assert_eq!(dialect.field_names.map(|names| names.len()), Some(3));
    }

    #[test]
    fn preferred_separators_are_configurable() {
        let text = "a:b:c\n1:2:3\n4:5:6\n";
        let options = InferenceOptions {
            preferred_separators: ":".to_string(),
            ..InferenceOptions::default()
        };
        assert_eq!(detect(text, &options).separator, ':');
        // still found without preference once it averages two per line
        assert_eq!(detect_default(text).separator, ':');
    }

    #[test]
    fn dialect_serializes_to_yaml() {
        let dialect = Dialect::delimited(';', None).with_header(Some(true));
        let yaml = serde_yaml::to_string(&dialect).expect("serialize");
        let parsed: Dialect = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(parsed, dialect);
    }

    #[test]
    fn printable_separator_names_whitespace() {
        assert_eq!(printable_separator('\t'), "\\t");
        assert_eq!(printable_separator(' '), "<space>");
        assert_eq!(printable_separator('\0'), "<undetermined>");
        assert_eq!(printable_separator('|'), "|");
    }
}
