//! Whole-table schema inference.
//!
//! [`infer_schema`] feeds every row of an already tokenized table through a
//! [`ColumnStat`] per column, decides whether the first row is a header by
//! comparing it against the statistics of the rest of the table, and derives
//! safe, unique column names.
//!
//! ## Responsibilities
//!
//! - Ragged rows: short rows leave trailing columns untouched; those columns
//!   receive one synthetic empty value so they end up nullable.
//! - Header detection when the dialect does not already say.
//! - Column naming from explicit dialect field names, the header row, or
//!   `Col{n}` placeholders, with collision suffixes.
//! - A serializable [`SchemaReport`] for persisting results.

use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    column::{ColumnStat, DataKind},
    config::InferenceOptions,
    dialect::Dialect,
    error::{InferenceError, InferenceResult},
    number::DecimalDialect,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaColumn {
    pub name: String,
    pub stat: ColumnStat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub columns: Vec<SchemaColumn>,
    pub has_header: bool,
    /// Sanitized column name to the raw text it was derived from, for
    /// names that had to change.
    pub unsafe_names: BTreeMap<String, String>,
}

impl TableSchema {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn original_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.unsafe_names.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn report(&self) -> SchemaReport {
        SchemaReport {
            has_header: self.has_header,
            columns: self
                .columns
                .iter()
                .map(|column| ColumnReport::new(column, self.unsafe_names.get(&column.name)))
                .collect(),
        }
    }
}

/// Infers column kinds, header presence and names for a tokenized table.
///
/// Fails with [`InferenceError::InvalidInput`] when `rows` is empty.
pub fn infer_schema<R, S>(
    rows: &[R],
    dialect: &Dialect,
    options: &InferenceOptions,
) -> InferenceResult<TableSchema>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let (first_row, rest) = rows.split_first().ok_or(InferenceError::InvalidInput)?;

    let mut header_stats: Vec<ColumnStat> = first_row
        .as_ref()
        .iter()
        .map(|value| ColumnStat::from_first(value.as_ref(), options))
        .collect();

    let body = if dialect.has_header == Some(false) {
        rows
    } else {
        rest
    };
    let mut columns: Vec<ColumnStat> = Vec::new();
    for row in body {
        for (idx, value) in row.as_ref().iter().enumerate() {
            let value = value.as_ref();
            match columns.get_mut(idx) {
                Some(stat) => stat.update(value, options),
                None => columns.push(ColumnStat::from_first(value, options)),
            }
        }
    }

    let max_seen = columns.iter().map(ColumnStat::values_seen).max().unwrap_or(0);
    let mut filled = 0usize;
    for stat in columns.iter_mut().filter(|stat| stat.values_seen() < max_seen) {
        stat.update("", options);
        filled += 1;
    }
    if filled > 0 {
        debug!("Marked {filled} column(s) nullable: missing on shorter rows");
    }

    let width = columns.len().max(header_stats.len());
    let body_width = columns.len();
    columns.resize_with(width, ColumnStat::absent);
    header_stats.resize_with(width, ColumnStat::absent);

    let has_header = match dialect.has_header {
        Some(has_header) => has_header,
        None => {
            let detected = columns
                .iter()
                .zip(&header_stats)
                .any(|(body, header)| body.is_significantly_different(header));
            if !detected {
                for (body, header) in columns.iter_mut().zip(&header_stats) {
                    body.merge(header);
                }
            }
            info!(
                "First row {} a header",
                if detected { "looks like" } else { "is not" }
            );
            detected
        }
    };

    // body rows existed but none reached these columns
    if max_seen > 0 {
        for stat in &mut columns[body_width..] {
            stat.mark_nullable();
        }
    }

    let explicit_names = dialect.field_names.as_deref().unwrap_or(&[]);
    let mut namer = ColumnNamer::default();
    let mut unsafe_names = BTreeMap::new();
    let mut schema_columns = Vec::with_capacity(width);
    for (idx, (stat, header)) in columns.into_iter().zip(&header_stats).enumerate() {
        let raw = explicit_names
            .get(idx)
            .map(String::as_str)
            .or_else(|| has_header.then(|| header.creation_value()).flatten());
        let name = namer.assign(idx, raw);
        if let Some(original) = raw
            && !original.trim().is_empty()
            && original != name
        {
            unsafe_names.insert(name.clone(), original.to_string());
        }
        schema_columns.push(SchemaColumn { name, stat });
    }

    Ok(TableSchema {
        columns: schema_columns,
        has_header,
        unsafe_names,
    })
}

/// Strips everything but alphanumerics and underscores.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect()
}

#[derive(Debug, Default)]
struct ColumnNamer {
    taken: HashSet<String>,
}

impl ColumnNamer {
    fn assign(&mut self, idx: usize, raw: Option<&str>) -> String {
        let sanitized = raw.map(sanitize_name).unwrap_or_default();
        let base = if sanitized.is_empty() {
            format!("Col{}", idx + 1)
        } else {
            sanitized
        };
        let mut candidate = base.clone();
        let mut suffix = 2usize;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        candidate
    }
}

/// Serializable summary of one inferred column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub kind: DataKind,
    pub nullable: bool,
    pub values_seen: usize,
    pub min_size: usize,
    pub max_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_notation: Option<DecimalDialect>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub common_prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub common_suffix: String,
    /// Distinct values, when the column has no more than a handful.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_values: Vec<String>,
}

impl ColumnReport {
    fn new(column: &SchemaColumn, original_name: Option<&String>) -> Self {
        let stat = &column.stat;
        let range = stat.integer_range();
        let literals = stat.common_literals();
        Self {
            name: column.name.clone(),
            original_name: original_name.cloned(),
            kind: stat.kind(),
            nullable: stat.nullable(),
            values_seen: stat.values_seen(),
            min_size: stat.min_size(),
            max_size: stat.max_size(),
            min_integer: range.map(|(min, _)| min),
            max_integer: range.map(|(_, max)| max),
            decimal_notation: (stat.kind() == DataKind::Decimal).then(|| stat.decimal_dialect()),
            common_prefix: stat.common_prefix().to_string(),
            common_suffix: stat.common_suffix().to_string(),
            common_values: if literals.is_overflowed() {
                Vec::new()
            } else {
                literals.iter().map(str::to_string).collect()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub has_header: bool,
    pub columns: Vec<ColumnReport>,
}

/// Dialect and schema of one probed input, as written by `csv-probe schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub dialect: Dialect,
    pub schema: SchemaReport,
}

impl ProbeReport {
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            serde_json::to_string_pretty(self).context("Serializing report as JSON")
        } else {
            serde_yaml::to_string(self).context("Serializing report as YAML")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening report file {path:?}"))?;
        let reader = BufReader::new(file);
        let report = if is_json(path) {
            serde_json::from_reader(reader).context("Parsing report JSON")?
        } else {
            serde_yaml::from_reader(reader).context("Parsing report YAML")?
        };
        Ok(report)
    }
}

/// True when `path` carries a `.json` extension.
pub fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn infer(rows: &[Vec<&str>]) -> TableSchema {
        infer_schema(rows, &Dialect::delimited(',', Some('"')), &InferenceOptions::default())
            .expect("infer schema")
    }

    #[test]
    fn empty_input_is_rejected() {
        let rows: Vec<Vec<&str>> = Vec::new();
        let result = infer_schema(&rows, &Dialect::default(), &InferenceOptions::default());
        assert_eq!(result, Err(InferenceError::InvalidInput));
    }

    #[test]
    fn text_header_over_numbers_is_detected() {
        let schema = infer(&[
            vec!["id", "price"],
            vec!["1", "9.99"],
            vec!["2", "12.50"],
        ]);
        assert!(schema.has_header);
        assert_eq!(schema.column_names(), vec!["id", "price"]);
        assert_eq!(schema.columns[0].stat.kind(), DataKind::Integer);
        assert_eq!(schema.columns[0].stat.values_seen(), 2);
        assert_eq!(schema.columns[1].stat.kind(), DataKind::Decimal);
    }

    #[test]
    fn numeric_first_row_is_folded_back() {
        let schema = infer(&[vec!["0"], vec!["1"], vec!["2"], vec!["3"]]);
        assert!(!schema.has_header);
        let stat = &schema.columns[0].stat;
        assert_eq!(stat.integer_range(), Some((0, 3)));
        assert_eq!(stat.values_seen(), 4);
        assert_eq!(schema.column_names(), vec!["Col1"]);
    }

    #[test]
    fn dialect_header_flag_wins() {
        let rows = vec![vec!["id"], vec!["1"], vec!["2"]];
        let absent = infer_schema(
            &rows,
            &Dialect::delimited(',', None).with_header(Some(false)),
            &InferenceOptions::default(),
        )
        .expect("infer");
        assert!(!absent.has_header);
        assert_eq!(absent.columns[0].stat.kind(), DataKind::String);
        assert_eq!(absent.columns[0].name, "Col1");

        let present = infer_schema(
            &[vec!["1"], vec!["2"]],
            &Dialect::delimited(',', None).with_header(Some(true)),
            &InferenceOptions::default(),
        )
        .expect("infer");
        assert!(present.has_header);
        assert_eq!(present.columns[0].name, "1");
        assert_eq!(present.columns[0].stat.values_seen(), 1);
    }

    #[test]
    fn short_rows_leave_columns_nullable() {
        let schema = infer(&[vec!["a", "b", "c"], vec!["d", "e"], vec!["f", "g", "h"]]);
        let third = &schema.columns[2].stat;
        assert!(third.nullable());
        assert!(!schema.columns[0].stat.nullable());
    }

    #[test]
    fn header_wider_than_body_pads_columns() {
        let schema = infer(&[vec!["id", "name", "extra"], vec!["1", "x"], vec!["2", "y"]]);
        assert!(schema.has_header);
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.columns[2].name, "extra");
        assert_eq!(schema.columns[2].stat.kind(), DataKind::Empty);
        assert!(schema.columns[2].stat.nullable());
    }

    #[test]
    fn single_row_matches_explicit_no_header() {
        let rows = vec![vec!["12", "345"]];
        let detected = infer(&rows);
        let explicit = infer_schema(
            &rows,
            &Dialect::delimited(',', Some('"')).with_header(Some(false)),
            &InferenceOptions::default(),
        )
        .expect("infer");
        assert!(!detected.has_header);
        assert_eq!(detected.columns, explicit.columns);
        let first = &detected.columns[0].stat;
        assert!(!first.nullable());
        assert_eq!(first.min_size(), 2);
        assert_eq!(first.common_prefix(), "12");
        assert_eq!(first.integer_range(), Some((12, 12)));
    }

    #[test]
    fn wide_first_row_folded_back_keeps_missing_columns_nullable() {
        let schema = infer(&[vec!["1", "2", "3"], vec!["4", "5"], vec!["6", "7"]]);
        assert!(!schema.has_header);
        let third = &schema.columns[2].stat;
        assert_eq!(third.kind(), DataKind::Integer);
        assert_eq!(third.values_seen(), 1);
        assert!(third.nullable());
        assert!(!schema.columns[0].stat.nullable());
    }

    #[test]
    fn body_wider_than_header_gets_placeholder_names() {
        let schema = infer(&[vec!["id"], vec!["1", "x"], vec!["2", "y"]]);
        assert!(schema.has_header);
        assert_eq!(schema.column_names(), vec!["id", "Col2"]);
    }

    #[test]
    fn names_are_sanitized_and_deduplicated() {
        let schema = infer(&[
            vec!["Id", "Id", "Name", "Unit price ($)", "%", "id"],
            vec!["1", "2", "x", "3.5", "4", "5"],
        ]);
        assert_eq!(
            schema.column_names(),
            vec!["Id", "Id2", "Name", "Unitprice", "Col5", "id3"]
        );
        assert_eq!(schema.original_name("Unitprice"), "Unit price ($)");
        assert_eq!(schema.unsafe_names.get("Col5").map(String::as_str), Some("%"));
        assert_eq!(schema.unsafe_names.get("Id2").map(String::as_str), Some("Id"));
        assert!(!schema.unsafe_names.contains_key("Name"));
    }

    #[test]
    fn explicit_field_names_take_priority() {
        let mut dialect = Dialect::delimited(' ', None).with_header(Some(false));
        dialect.field_names = Some(vec!["date".to_string(), "cs-uri".to_string()]);
        let schema = infer_schema(
            &[vec!["2024-01-01", "/a"], vec!["2024-01-02", "/b"]],
            &dialect,
            &InferenceOptions::default(),
        )
        .expect("infer");
        assert_eq!(schema.column_names(), vec!["date", "csuri"]);
        assert_eq!(schema.original_name("csuri"), "cs-uri");
        assert_eq!(schema.columns[0].stat.values_seen(), 2);
    }

    #[test]
    fn report_round_trips_through_yaml_and_json() {
        let schema = infer(&[vec!["qty", "code"], vec!["1", "A-1"], vec!["5", "A-2"]]);
        let report = ProbeReport {
            dialect: Dialect::delimited(',', Some('"')).with_header(Some(true)),
            schema: schema.report(),
        };
        let qty = &report.schema.columns[0];
        assert_eq!(qty.min_integer, Some(1));
        assert_eq!(qty.max_integer, Some(5));
        assert_eq!(report.schema.columns[1].common_prefix, "A-");

        let dir = tempdir().expect("temp dir");
        for name in ["report.yml", "report.json"] {
            let path = dir.path().join(name);
            let rendered = report.render(is_json(&path)).expect("render report");
            std::fs::write(&path, rendered).expect("write report");
            let loaded = ProbeReport::load(&path).expect("load report");
            assert_eq!(loaded, report);
        }
    }
}
