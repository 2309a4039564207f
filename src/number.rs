//! Numeric literal notations.
//!
//! A decimal literal can be written in several notations: the invariant form
//! (`1234.5`), the comma-decimal form common in continental Europe
//! (`1 234,5`), and whatever the caller's locale uses. [`DecimalDialect`]
//! records which of those notations a column is still compatible with, and
//! [`NumberFormat`] describes a single notation. The locale is always passed
//! in explicitly; nothing here reads process or thread locale.

use std::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Decimal and grouping separators of one numeric notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberFormat {
    pub decimal_separator: char,
    #[serde(default)]
    pub group_separator: Option<char>,
}

impl NumberFormat {
    /// `.` decimal point, no grouping.
    pub const INVARIANT: NumberFormat = NumberFormat {
        decimal_separator: '.',
        group_separator: None,
    };

    /// `,` decimal point, space grouping.
    pub const COMMA_DECIMAL: NumberFormat = NumberFormat {
        decimal_separator: ',',
        group_separator: Some(' '),
    };

    pub fn new(decimal_separator: char, group_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            group_separator,
        }
    }

    /// Parses `text` as a decimal written in this notation.
    ///
    /// Accepts surrounding whitespace, one leading sign, grouping separators
    /// between integer digits and at most one decimal separator. Values that
    /// do not fit a 96-bit decimal are rejected.
    pub fn parse_decimal(&self, text: &str) -> Option<Decimal> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let mut normalized = String::with_capacity(body.len() + 2);
        if negative {
            normalized.push('-');
        }
        let mut digits = 0usize;
        let mut integer_digits = 0usize;
        let mut seen_decimal = false;
        let mut last_was_digit = false;
        let mut last_was_group = false;

        for ch in body.chars() {
            if ch.is_ascii_digit() {
                if integer_digits == 0 && seen_decimal && normalized.ends_with('.') && digits == 0 {
                    // ".5" style literal; give the parser an explicit zero
                    normalized.insert(normalized.len() - 1, '0');
                }
                digits += 1;
                if !seen_decimal {
                    integer_digits += 1;
                }
                normalized.push(ch);
                last_was_digit = true;
                last_was_group = false;
                continue;
            }
            if ch == self.decimal_separator {
                if seen_decimal || last_was_group {
                    return None;
                }
                seen_decimal = true;
                normalized.push('.');
                last_was_digit = false;
                continue;
            }
            if Some(ch) == self.group_separator && !seen_decimal && last_was_digit {
                last_was_digit = false;
                last_was_group = true;
                continue;
            }
            return None;
        }

        if digits == 0 || last_was_group {
            return None;
        }
        if normalized.ends_with('.') {
            normalized.pop();
        }
        Decimal::from_str(&normalized).ok()
    }
}

/// Bitset of the decimal notations a column is still compatible with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalDialect(u8);

impl DecimalDialect {
    pub const NONE: DecimalDialect = DecimalDialect(0);
    pub const INVARIANT: DecimalDialect = DecimalDialect(0b001);
    pub const COMMA_DECIMAL: DecimalDialect = DecimalDialect(0b010);
    pub const LOCALE_DECIMAL: DecimalDialect = DecimalDialect(0b100);
    pub const ANY: DecimalDialect = DecimalDialect(0b111);

    const NAMED: [(DecimalDialect, &'static str); 3] = [
        (DecimalDialect::INVARIANT, "invariant"),
        (DecimalDialect::COMMA_DECIMAL, "comma"),
        (DecimalDialect::LOCALE_DECIMAL, "locale"),
    ];

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: DecimalDialect) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersection(self, other: DecimalDialect) -> DecimalDialect {
        DecimalDialect(self.0 & other.0)
    }

    pub const fn union(self, other: DecimalDialect) -> DecimalDialect {
        DecimalDialect(self.0 | other.0)
    }

    /// Single-flag members of this set, in trial order.
    pub fn flags(self) -> impl Iterator<Item = DecimalDialect> {
        Self::NAMED
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Notation for a single flag. The locale flag resolves to `locale`, or
    /// to nothing when no locale was supplied.
    pub fn format(self, locale: Option<&NumberFormat>) -> Option<NumberFormat> {
        match self {
            DecimalDialect::INVARIANT => Some(NumberFormat::INVARIANT),
            DecimalDialect::COMMA_DECIMAL => Some(NumberFormat::COMMA_DECIMAL),
            DecimalDialect::LOCALE_DECIMAL => locale.copied(),
            _ => None,
        }
    }

    /// First flag of this set under which `text` parses as a decimal.
    pub fn first_match(self, text: &str, locale: Option<&NumberFormat>) -> Option<DecimalDialect> {
        self.flags().find(|flag| {
            flag.format(locale)
                .is_some_and(|format| format.parse_decimal(text).is_some())
        })
    }

    fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for DecimalDialect {
    fn default() -> Self {
        DecimalDialect::ANY
    }
}

impl BitAnd for DecimalDialect {
    type Output = DecimalDialect;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl BitAndAssign for DecimalDialect {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.intersection(rhs);
    }
}

impl BitOr for DecimalDialect {
    type Output = DecimalDialect;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for DecimalDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl FromStr for DecimalDialect {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut dialect = DecimalDialect::NONE;
        for token in value.split(['|', ',']).map(str::trim).filter(|t| !t.is_empty()) {
            let lowered = token.to_ascii_lowercase();
            let flag = match lowered.as_str() {
                "invariant" => DecimalDialect::INVARIANT,
                "comma" | "comma-decimal" | "comma_decimal" => DecimalDialect::COMMA_DECIMAL,
                "locale" | "local" => DecimalDialect::LOCALE_DECIMAL,
                "any" | "all" => DecimalDialect::ANY,
                "none" => DecimalDialect::NONE,
                other => return Err(format!("Unknown decimal dialect '{other}'")),
            };
            dialect = dialect | flag;
        }
        Ok(dialect)
    }
}

impl Serialize for DecimalDialect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.names())
    }
}

impl<'de> Deserialize<'de> for DecimalDialect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            List(Vec<String>),
            Text(String),
        }

        let joined = match Repr::deserialize(deserializer)? {
            Repr::List(items) => items.join("|"),
            Repr::Text(text) => text,
        };
        joined.parse().map_err(de::Error::custom)
    }
}
