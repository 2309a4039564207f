//! Input reading and tokenization.
//!
//! All file I/O in csv-probe flows through this module. It provides:
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **stdin**: the `-` path convention routes through standard input.
//! - **Tokenization**: splitting decoded text into rows of fields according
//!   to a detected or user-supplied [`Dialect`]. Delimited text with an ASCII
//!   separator goes through the `csv` reader; fixed-width text is cut by
//!   character widths.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::dialect::{Dialect, REST_OF_LINE, UNDETERMINED};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Reads and decodes the whole input, `-` meaning stdin. A byte order mark,
/// when present, overrides `encoding`.
pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading standard input")?;
    } else {
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    decode_bytes(&bytes, encoding)
}

/// Splits `text` into rows of fields. `limit` caps the number of rows
/// returned; `None` reads everything.
pub fn tokenize(text: &str, dialect: &Dialect, limit: Option<usize>) -> Result<Vec<Vec<String>>> {
    let limit = limit.unwrap_or(usize::MAX);
    let rows = if let Some(widths) = dialect.fixed_widths.as_deref().filter(|w| !w.is_empty()) {
        data_lines(text, dialect.comment)
            .take(limit)
            .map(|line| cut_fixed_width(line, widths))
            .collect()
    } else if dialect.separator == UNDETERMINED {
        bail!("Unable to determine the separator; pass --separator explicitly");
    } else if dialect.separator.is_ascii() {
        read_delimited(text, dialect, limit)?
    } else {
        data_lines(text, dialect.comment)
            .take(limit)
            .map(|line| line.split(dialect.separator).map(str::to_string).collect())
            .collect()
    };
    debug!("Tokenized {} row(s)", rows.len());
    Ok(rows)
}

fn data_lines(text: &str, comment: Option<char>) -> impl Iterator<Item = &str> {
    text.lines().filter(move |line| {
        !line.trim().is_empty() && comment.is_none_or(|marker| !line.starts_with(marker))
    })
}

fn read_delimited(text: &str, dialect: &Dialect, limit: usize) -> Result<Vec<Vec<String>>> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .delimiter(dialect.separator as u8)
        .double_quote(true);
    match dialect.quote.filter(char::is_ascii) {
        Some(quote) => {
            builder.quoting(true).quote(quote as u8);
        }
        None => {
            builder.quoting(false);
        }
    }
    builder.comment(dialect.comment.filter(char::is_ascii).map(|c| c as u8));

    let mut reader = builder.from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for (idx, record) in reader.records().take(limit).enumerate() {
        let record = record.with_context(|| format!("Reading record {}", idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn cut_fixed_width(line: &str, widths: &[i32]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::with_capacity(widths.len());
    let mut start = 0usize;
    for &width in widths {
        if start >= chars.len() {
            break;
        }
        let end = if width == REST_OF_LINE || width < 0 {
            chars.len()
        } else {
            (start + width as usize).min(chars.len())
        };
        let field: String = chars[start..end].iter().collect();
        fields.push(field.trim().to_string());
        start = end;
    }
    fields
}
