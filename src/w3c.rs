//! W3C extended log format recognition.
//!
//! Web server logs (IIS and friends) open with `#Key: value` directives and
//! name their columns in a `#Fields:` directive, so the dialect can be read
//! straight from the preamble instead of being inferred statistically.

use std::collections::HashMap;

use log::debug;

use crate::dialect::Dialect;

const DIRECTIVE: char = '#';
const VERSION_KEY: &str = "Version";
const FIELDS_KEY: &str = "Fields";

#[derive(Debug, Default, PartialEq, Eq)]
struct WhitespaceCounts {
    tabs: usize,
    spaces: usize,
    runs: usize,
}

impl WhitespaceCounts {
    fn of(line: &str) -> Self {
        let mut counts = WhitespaceCounts::default();
        let mut in_run = false;
        for ch in line.trim().chars() {
            match ch {
                '\t' => counts.tabs += 1,
                ' ' => counts.spaces += 1,
                _ => {}
            }
            let is_space = ch.is_whitespace();
            if is_space && !in_run {
                counts.runs += 1;
            }
            in_run = is_space;
        }
        counts
    }

    fn separator_for(&self, field_count: usize) -> Option<char> {
        let gaps = field_count.saturating_sub(1);
        if self.tabs == gaps {
            return Some('\t');
        }
        if self.spaces == gaps {
            return Some(' ');
        }
        if self.runs == gaps {
            if self.tabs > self.spaces && self.tabs < field_count {
                return Some('\t');
            }
            if self.spaces < field_count && self.spaces > 1 {
                return Some(' ');
            }
        }
        None
    }
}

/// Reads a W3C extended log preamble. Returns `None` when `text` is not such
/// a log or its first data row does not line up with the `#Fields:` list.
pub fn detect_w3c(text: &str) -> Option<Dialect> {
    if !text.starts_with(DIRECTIVE) {
        return None;
    }

    let mut directives: HashMap<&str, &str> = HashMap::new();
    let mut first_row = None;
    for line in text.lines() {
        if let Some(directive) = line.strip_prefix(DIRECTIVE) {
            if let Some((key, value)) = directive.split_once(':') {
                directives.insert(key.trim(), value.trim());
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        first_row = Some(line);
        break;
    }

    if !directives.contains_key(VERSION_KEY) {
        return None;
    }
    let field_names: Vec<String> = directives
        .get(FIELDS_KEY)?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if field_names.is_empty() {
        return None;
    }

    let counts = WhitespaceCounts::of(first_row?);
    let Some(separator) = counts.separator_for(field_names.len()) else {
        debug!(
            "W3C preamble found but first row does not match {} field(s): {counts:?}",
            field_names.len()
        );
        return None;
    };
    debug!(
        "W3C log detected with {} field(s), separator {:?}",
        field_names.len(),
        separator
    );

    Some(Dialect {
        separator,
        quote: None,
        comment: Some(DIRECTIVE),
        fixed_widths: None,
        has_header: Some(false),
        field_names: Some(field_names),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IIS_LOG: &str = "\
#Software: Microsoft Internet Information Services 10.0
#Version: 1.0
#Date: 2024-03-01 00:00:01
#Fields: date time s-ip cs-method cs-uri-stem sc-status
2024-03-01 00:00:01 10.0.0.1 GET /index.html 200
2024-03-01 00:00:02 10.0.0.1 GET /app.js 304
";

    #[test]
    fn reads_fields_directive() {
        let dialect = detect_w3c(IIS_LOG).expect("w3c dialect");
        assert_eq!(dialect.separator, ' ');
        assert_eq!(dialect.comment, Some('#'));
        assert_eq!(dialect.quote, None);
        assert_eq!(dialect.has_header, Some(false));
        let expected: Vec<String> = ["date", "time", "s-ip", "cs-method", "cs-uri-stem", "sc-status"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dialect.field_names, Some(expected));
    }

    #[test]
    fn tab_separated_rows_use_tab() {
        let text = "#Version: 1.0\n#Fields: a b c\nx\ty z\tw\n";
        // 2 tabs for 3 fields
        assert_eq!(detect_w3c(text).map(|d| d.separator), Some('\t'));
    }

    #[test]
    fn mixed_whitespace_falls_back_to_runs() {
        let text = "#Version: 1.0\n#Fields: a b c d e\n1\t\t2\t3 4 5\n";
        assert_eq!(
            WhitespaceCounts::of("1\t\t2\t3 4 5"),
            WhitespaceCounts {
                tabs: 3,
                spaces: 2,
                runs: 4
            }
        );
        assert_eq!(detect_w3c(text).map(|d| d.separator), Some('\t'));
    }

    #[test]
    fn mixed_whitespace_with_more_spaces_uses_space() {
        let row = "1 2 3 \t4\t5";
        assert_eq!(
            WhitespaceCounts::of(row),
            WhitespaceCounts {
                tabs: 2,
                spaces: 3,
                runs: 4
            }
        );
        let text = format!("#Version: 1.0\n#Fields: a b c d e\n{row}\n");
        assert_eq!(detect_w3c(&text).map(|d| d.separator), Some(' '));
    }

    #[test]
    fn requires_version_and_fields() {
        assert!(detect_w3c("#Fields: a b\n1 2\n").is_none());
        assert!(detect_w3c("#Version: 1.0\n1 2\n").is_none());
        assert!(detect_w3c("a b\n#Version: 1.0\n").is_none());
    }

    #[test]
    fn mismatched_row_abandons_fast_path() {
        let text = "#Version: 1.0\n#Fields: a b c d e\nonly two\n";
        assert!(detect_w3c(text).is_none());
    }

    #[test]
    fn preamble_without_rows_is_not_enough() {
        assert!(detect_w3c("#Version: 1.0\n#Fields: a b\n").is_none());
    }
}
