use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Detect CSV dialects and infer column schemas", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the separator, quoting and layout of a delimited or fixed-width file
    Dialect(DialectArgs),
    /// Infer column kinds, header presence and column names
    Schema(SchemaArgs),
}

/// Options shared by every subcommand that reads an input file.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file to inspect (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file with inference options
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Separators to favour during detection, e.g. ",;|\t"
    #[arg(long = "preferred-separators")]
    pub preferred_separators: Option<String>,
    /// Number of lines sampled by the dialect detector
    #[arg(long = "sample-lines")]
    pub sample_lines: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DialectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Destination report file (stdout if omitted); `.json` selects JSON
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Separator character, skipping detection (supports ',', 'tab', ';', '|', 'space')
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<char>,
    /// Whether the first row is a header
    #[arg(long, value_enum, default_value_t = HeaderMode::Auto)]
    pub header: HeaderMode,
    /// Number of rows to analyze (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Treat digit strings with leading zeros as integers
    #[arg(long = "allow-leading-zeros")]
    pub allow_leading_zeros: bool,
    /// Longest digit string still classified as an integer
    #[arg(long = "max-integer-digits")]
    pub max_integer_digits: Option<usize>,
    /// Decimal separator of the locale notation
    #[arg(long = "locale-decimal")]
    pub locale_decimal: Option<char>,
    /// Digit group separator of the locale notation
    #[arg(long = "locale-group", requires = "locale_decimal")]
    pub locale_group: Option<char>,
    /// Report format written to stdout or the output file
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// Print a column summary table instead of a report
    #[arg(long, conflicts_with_all = ["output", "format"])]
    pub table: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeaderMode {
    Auto,
    Present,
    Absent,
}

impl HeaderMode {
    pub fn as_hint(self) -> Option<bool> {
        match self {
            HeaderMode::Auto => None,
            HeaderMode::Present => Some(true),
            HeaderMode::Absent => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

pub fn parse_separator(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok('\t'),
        "comma" | "," => Ok(','),
        "|" | "pipe" => Ok('|'),
        ";" | "semicolon" => Ok(';'),
        "space" | " " => Ok(' '),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Separator cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Separator must be a single character".to_string());
            }
            if first == '\0' || first == '\n' || first == '\r' {
                return Err("Separator cannot be a line break or NUL".to_string());
            }
            Ok(first)
        }
    }
}
