//! Plain-text rendering of an inferred schema for terminal output.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{column::DataKind, schema::TableSchema};

const SUMMARY_HEADERS: [&str; 7] = ["#", "name", "kind", "nullable", "size", "range", "values"];

/// One line per column: kind, nullability, size bounds, integer range or
/// decimal notation, and the distinct values when there are few.
pub fn render_schema(schema: &TableSchema) -> String {
    let headers: Vec<String> = SUMMARY_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let stat = &column.stat;
            let range = match (stat.kind(), stat.integer_range()) {
                (DataKind::Integer, Some((min, max))) => format!("{min}..={max}"),
                (DataKind::Decimal, _) => stat.decimal_dialect().to_string(),
                _ => String::new(),
            };
            let literals = stat.common_literals();
            let values = if literals.is_overflowed() {
                "*".to_string()
            } else {
                literals.iter().collect::<Vec<_>>().join(", ")
            };
            vec![
                (idx + 1).to_string(),
                schema.original_name(&column.name).to_string(),
                stat.kind().to_string(),
                if stat.nullable() { "yes" } else { "no" }.to_string(),
                format!("{}-{}", stat.min_size(), stat.max_size()),
                range,
                values,
            ]
        })
        .collect();
    let mut output = render_table(&headers, &rows);
    let _ = writeln!(
        output,
        "header row: {}",
        if schema.has_header { "present" } else { "absent" }
    );
    output
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h).max(1)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::InferenceOptions, dialect::Dialect, schema::infer_schema};

    #[test]
    fn aligns_columns() {
        let headers = vec!["a".to_string(), "long header".to_string()];
        let rows = vec![vec!["wide value".to_string(), "x\ty".to_string()]];
        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], format!("a{}long header", " ".repeat(11)));
        assert_eq!(lines[1], "----------  -----------");
        assert_eq!(lines[2], "wide value  x y");
    }

    #[test]
    fn summarizes_schema() {
        let rows = vec![
            vec!["Unit price", "qty", "flag"],
            vec!["1.5", "3", "Y"],
            vec!["2.25", "10", "N"],
        ];
        let schema = infer_schema(
            &rows,
            &Dialect::delimited(',', Some('"')),
            &InferenceOptions::default(),
        )
        .expect("infer");
        let rendered = render_schema(&schema);
        assert!(rendered.contains("Unit price"));
        assert!(rendered.contains("3..=10"));
        assert!(rendered.contains("N, Y"));
        assert!(rendered.ends_with("header row: present\n"));
    }
}
