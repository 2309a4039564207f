pub mod cli;
pub mod column;
pub mod config;
pub mod dialect;
pub mod error;
pub mod fixed_width;
pub mod frequency;
pub mod io_utils;
pub mod number;
pub mod schema;
pub mod separator;
pub mod table;
pub mod w3c;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, DialectArgs, InputArgs, OutputFormat, SchemaArgs},
    config::InferenceOptions,
    dialect::{Dialect, printable_separator},
    number::{DecimalDialect, NumberFormat},
    schema::{ProbeReport, infer_schema, is_json},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_probe", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Dialect(args) => handle_dialect(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn load_options(args: &InputArgs) -> Result<InferenceOptions> {
    let mut options = match &args.config {
        Some(path) => InferenceOptions::load(path)?,
        None => InferenceOptions::default(),
    };
    if let Some(separators) = &args.preferred_separators {
        options.preferred_separators = separators.clone();
    }
    if let Some(lines) = args.sample_lines {
        options.sample_lines = lines;
    }
    Ok(options)
}

fn read_input(args: &InputArgs) -> Result<String> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    io_utils::read_text(&args.input, encoding)
        .with_context(|| format!("Reading {:?}", args.input))
}

fn handle_dialect(args: &DialectArgs) -> Result<()> {
    let options = load_options(&args.input)?;
    options.validate()?;
    info!("Detecting dialect of '{}'", args.input.input.display());
    let text = read_input(&args.input)?;
    let dialect = dialect::detect(&text, &options);
    if !dialect.is_determined() {
        info!("No separator or fixed-width layout found; pass --separator to the schema command");
    }
    print!(
        "{}",
        serde_yaml::to_string(&dialect).context("Serializing dialect as YAML")?
    );
    Ok(())
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let mut options = load_options(&args.input)?;
    if args.allow_leading_zeros {
        options.allow_leading_zero_integers = true;
    }
    if let Some(digits) = args.max_integer_digits {
        options.max_integer_digit_length = digits;
    }
    if let Some(decimal) = args.locale_decimal {
        options.locale = Some(NumberFormat::new(decimal, args.locale_group));
        options.decimal_dialects = options.decimal_dialects | DecimalDialect::LOCALE_DECIMAL;
    }
    options.validate()?;

    let text = read_input(&args.input)?;
    let mut dialect = match args.separator {
        Some(separator) => {
            info!("Using separator '{}'", printable_separator(separator));
            Dialect::delimited(separator, Some(dialect::DEFAULT_QUOTE))
        }
        None => dialect::detect(&text, &options),
    };
    if let Some(has_header) = args.header.as_hint() {
        dialect.has_header = Some(has_header);
    }

    let limit = (args.sample_rows > 0).then_some(args.sample_rows);
    let rows = io_utils::tokenize(&text, &dialect, limit)
        .with_context(|| format!("Tokenizing {:?}", args.input.input))?;
    debug!("Analyzing {} row(s)", rows.len());
    let schema = infer_schema(&rows, &dialect, &options)
        .with_context(|| format!("Inferring schema from {:?}", args.input.input))?;
    info!(
        "Inferred {} column(s); header row {}",
        schema.columns.len(),
        if schema.has_header { "present" } else { "absent" }
    );

    if args.table {
        print!("{}", table::render_schema(&schema));
        return Ok(());
    }

    dialect.has_header = Some(schema.has_header);
    let report = ProbeReport {
        dialect,
        schema: schema.report(),
    };
    let json = match args.format {
        Some(OutputFormat::Json) => true,
        Some(OutputFormat::Yaml) => false,
        None => args.output.as_deref().is_some_and(is_json),
    };
    let rendered = report.render(json)?;
    match &args.output {
        Some(path) if !io_utils::is_dash(path) => {
            fs::write(path, rendered).with_context(|| format!("Writing report to {path:?}"))?;
            info!("Schema report written to {path:?}");
        }
        _ => print!("{rendered}"),
    }
    Ok(())
}
