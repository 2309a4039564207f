//! Per-column statistics gathered in a single pass.
//!
//! [`ColumnStat`] folds values in one at a time with [`ColumnStat::update`]
//! and combines partial results with [`ColumnStat::merge`]. The column kind
//! only ever moves up the [`DataKind`] lattice, and `merge` is commutative
//! and associative on every observable field, so a table can be scanned in
//! row partitions and the partial statistics combined afterwards.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    config::InferenceOptions,
    number::{DecimalDialect, NumberFormat},
};

/// Upper bound on distinct literals remembered per column.
pub const MAX_COMMON_LITERALS: usize = 10;

const HEADER_RARE_VALUE_MIN_SAMPLES: usize = 30;
const SHORT_VALUE_LEN: usize = 10;
const LONG_VALUE_LEN: usize = 20;

/// Generalization lattice of column types: `Empty < Integer < Decimal < String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DataKind {
    Empty = 0,
    Integer = 1,
    Decimal = 2,
    String = 4,
}

impl DataKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataKind::Integer | DataKind::Decimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Empty => "empty",
            DataKind::Integer => "integer",
            DataKind::Decimal => "decimal",
            DataKind::String => "string",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded set of distinct literals; gives up (permanently) once more than
/// [`MAX_COMMON_LITERALS`] distinct values have been offered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonLiterals {
    values: BTreeSet<String>,
    overflowed: bool,
}

impl CommonLiterals {
    pub fn record(&mut self, value: &str) {
        if self.overflowed || self.values.contains(value) {
            return;
        }
        if self.values.len() >= MAX_COMMON_LITERALS {
            self.overflow();
            return;
        }
        self.values.insert(value.to_string());
    }

    pub fn merge(&mut self, other: &CommonLiterals) {
        if self.overflowed {
            return;
        }
        if other.overflowed {
            self.overflow();
            return;
        }
        for value in &other.values {
            self.record(value);
            if self.overflowed {
                return;
            }
        }
    }

    fn overflow(&mut self) {
        self.overflowed = true;
        self.values.clear();
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}

enum IntegerLiteral {
    Accepted(i64),
    /// Parses as an integer but breaks the leading-zero or length rule.
    Rejected,
    NotInteger,
}

fn classify_integer(literal: &str, options: &InferenceOptions) -> IntegerLiteral {
    let Ok(value) = literal.parse::<i64>() else {
        return IntegerLiteral::NotInteger;
    };
    let digits = literal.trim_start_matches(['-', '+']);
    if !options.allow_leading_zero_integers && digits.len() > 1 && digits.starts_with('0') {
        return IntegerLiteral::Rejected;
    }
    if literal.len() > options.max_integer_digit_length {
        return IntegerLiteral::Rejected;
    }
    IntegerLiteral::Accepted(value)
}

fn common_prefix(left: &str, right: &str) -> String {
    left.chars()
        .zip(right.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect()
}

fn common_suffix(left: &str, right: &str) -> String {
    let reversed: Vec<char> = left
        .chars()
        .rev()
        .zip(right.chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();
    reversed.into_iter().rev().collect()
}

/// Incremental statistics for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStat {
    kind: DataKind,
    decimal_dialect: DecimalDialect,
    min_size: usize,
    max_size: usize,
    min_integer: i64,
    max_integer: i64,
    nullable: bool,
    common_prefix: String,
    common_suffix: String,
    values_seen: usize,
    literals: CommonLiterals,
    creation_value: Option<String>,
}

impl ColumnStat {
    /// Starts a column from its first observed value.
    pub fn from_first(text: &str, options: &InferenceOptions) -> Self {
        let size = text.chars().count();
        let mut literals = CommonLiterals::default();
        literals.record(text);
        let mut stat = Self {
            kind: DataKind::Empty,
            decimal_dialect: options.decimal_dialects,
            min_size: size,
            max_size: size,
            min_integer: i64::MAX,
            max_integer: i64::MIN,
            nullable: false,
            common_prefix: text.to_string(),
            common_suffix: text.to_string(),
            values_seen: 1,
            literals,
            creation_value: Some(text.to_string()),
        };
        stat.classify(text, options);
        stat
    }

    /// A column that has no observed values: empty, nullable, zero-sized.
    pub fn absent() -> Self {
        Self {
            kind: DataKind::Empty,
            decimal_dialect: DecimalDialect::ANY,
            min_size: 0,
            max_size: 0,
            min_integer: i64::MAX,
            max_integer: i64::MIN,
            nullable: true,
            common_prefix: String::new(),
            common_suffix: String::new(),
            values_seen: 0,
            literals: CommonLiterals::default(),
            creation_value: None,
        }
    }

    /// Folds one more observed value into the statistics.
    pub fn update(&mut self, text: &str, options: &InferenceOptions) {
        self.values_seen += 1;
        let size = text.chars().count();
        self.min_size = self.min_size.min(size);
        self.max_size = self.max_size.max(size);
        if !text.starts_with(self.common_prefix.as_str()) {
            self.common_prefix = common_prefix(&self.common_prefix, text);
        }
        if !text.ends_with(self.common_suffix.as_str()) {
            self.common_suffix = common_suffix(&self.common_suffix, text);
        }
        self.literals.record(text);
        if self.creation_value.is_none() {
            self.creation_value = Some(text.to_string());
        }
        self.classify(text, options);
    }

    fn classify(&mut self, text: &str, options: &InferenceOptions) {
        let literal = text.trim();
        if literal.is_empty() {
            self.nullable = true;
            return;
        }
        if self.kind == DataKind::String {
            return;
        }

        if self.kind <= DataKind::Integer {
            match classify_integer(literal, options) {
                IntegerLiteral::Accepted(value) => {
                    self.kind = DataKind::Integer;
                    self.min_integer = self.min_integer.min(value);
                    self.max_integer = self.max_integer.max(value);
                    return;
                }
                IntegerLiteral::Rejected => {
                    self.kind = DataKind::String;
                    return;
                }
                IntegerLiteral::NotInteger => {}
            }
        }

        let locale = options.locale.as_ref();
        match self.decimal_dialect.first_match(literal, locale) {
            Some(_) if self.kind == DataKind::Decimal => {}
            Some(flag) => {
                self.kind = DataKind::Decimal;
                self.decimal_dialect = flag;
            }
            None => self.kind = DataKind::String,
        }
    }

    /// Combines statistics gathered over a disjoint set of values. A side
    /// that has seen no values leaves the other unchanged.
    pub fn merge(&mut self, other: &ColumnStat) {
        if other.values_seen == 0 {
            return;
        }
        if self.values_seen == 0 {
            *self = other.clone();
            return;
        }
        let kind = self.kind.max(other.kind);
        self.decimal_dialect &= other.decimal_dialect;
        self.kind = if kind == DataKind::Decimal && self.decimal_dialect.is_empty() {
            DataKind::String
        } else {
            kind
        };
        self.min_integer = self.min_integer.min(other.min_integer);
        self.max_integer = self.max_integer.max(other.max_integer);
        self.min_size = self.min_size.min(other.min_size);
        self.max_size = self.max_size.max(other.max_size);
        self.nullable |= other.nullable;
        self.common_prefix = common_prefix(&self.common_prefix, &other.common_prefix);
        self.common_suffix = common_suffix(&self.common_suffix, &other.common_suffix);
        self.values_seen += other.values_seen;
        self.literals.merge(&other.literals);
        if self.creation_value.is_none() {
            self.creation_value.clone_from(&other.creation_value);
        }
    }

    /// Records that the column was missing on some rows.
    pub fn mark_nullable(&mut self) {
        self.nullable = true;
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn decimal_dialect(&self) -> DecimalDialect {
        self.decimal_dialect
    }

    /// Notation shared by every decimal in the column, when it is down to one.
    pub fn decimal_format(&self, locale: Option<&NumberFormat>) -> Option<NumberFormat> {
        if self.kind != DataKind::Decimal {
            return None;
        }
        self.decimal_dialect.flags().next()?.format(locale)
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Inclusive integer bounds; only meaningful for integer columns.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        (self.kind == DataKind::Integer && self.min_integer <= self.max_integer)
            .then_some((self.min_integer, self.max_integer))
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn common_prefix(&self) -> &str {
        &self.common_prefix
    }

    pub fn common_suffix(&self) -> &str {
        &self.common_suffix
    }

    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    pub fn common_literals(&self) -> &CommonLiterals {
        &self.literals
    }

    /// First value the column was built from (the header text for a header row).
    pub fn creation_value(&self) -> Option<&str> {
        self.creation_value.as_deref()
    }

    pub fn is_single_value(&self) -> bool {
        !self.literals.is_overflowed() && self.literals.len() <= 1
    }

    /// Whether `header`, the single-row statistics of a candidate header
    /// cell, stands out from this column's body statistics.
    pub fn is_significantly_different(&self, header: &ColumnStat) -> bool {
        let header_literal = header.creation_value().unwrap_or("");

        if self.kind != DataKind::String && header.kind == DataKind::String {
            return true;
        }
        if header.kind == DataKind::Empty && self.nullable {
            return false;
        }
        if self.kind.is_numeric() && header.kind.is_numeric() {
            return false;
        }
        if self.values_seen > 0 && self.is_single_value() {
            return self.literals.iter().next() != Some(header_literal);
        }
        if !self.common_prefix.is_empty() {
            return !header_literal.starts_with(self.common_prefix.as_str());
        }
        if !self.common_suffix.is_empty() {
            return !header_literal.ends_with(self.common_suffix.as_str());
        }
        // well-sampled column with few distinct values that never saw the header text
        if self.values_seen > HEADER_RARE_VALUE_MIN_SAMPLES
            && !self.literals.is_overflowed()
            && self.literals.len() < MAX_COMMON_LITERALS
            && !self.literals.contains(header_literal)
        {
            return true;
        }
        if self.max_size < SHORT_VALUE_LEN && header_literal.chars().count() > LONG_VALUE_LEN {
            return true;
        }
        if self.min_size > LONG_VALUE_LEN && header.max_size < SHORT_VALUE_LEN {
            return true;
        }
        false
    }
}
