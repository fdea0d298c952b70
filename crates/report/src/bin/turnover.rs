//! Command line entry point: reshape saved exchange scrapes into reports.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnover_core::{Config, DatePolicy, OutputConfig, SourceConfig};
use turnover_ingestion::{fetch_with_retry, ObservationBuilder, RetryPolicy};
use turnover_pivot::{combine_daily, DailySeries, Pipeline};
use turnover_report::{
    CsvRowExtractor, CsvSink, QualityReport, ReportSink, SqliteSink, Table,
};

#[derive(Parser, Debug)]
#[command(name = "turnover", version, about = "Reshape exchange turnover scrapes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pivot a long-format scrape into the wide report.
    Wide(WideArgs),
    /// Join two single-value daily series on date.
    Combine(CombineArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Field delimiter of the input files.
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Year appended to date cells for sources that omit it.
    #[arg(long)]
    year: Option<i32>,
    /// Drop rows with unparseable dates instead of failing.
    #[arg(long)]
    skip_bad_dates: bool,
}

#[derive(Args, Debug)]
struct WideArgs {
    /// Raw long-format table (header line required).
    #[arg(long)]
    input: PathBuf,
    /// Source preset: mcx, nse-fo, bse-derivatives.
    #[arg(long, default_value = "mcx")]
    source: String,
    /// JSON configuration; overrides the preset.
    #[arg(long, env = "TURNOVER_CONFIG")]
    config: Option<PathBuf>,
    /// CSV output path.
    #[arg(long)]
    output: Option<PathBuf>,
    /// SQLite database to write the report into.
    #[arg(long)]
    sqlite: Option<PathBuf>,
    #[arg(long, default_value = "wide_report")]
    sqlite_table: String,
    /// Write the data quality report as JSON.
    #[arg(long)]
    quality: Option<PathBuf>,
    #[command(flatten)]
    input_args: InputArgs,
}

#[derive(Args, Debug)]
struct CombineArgs {
    #[arg(long)]
    left: PathBuf,
    #[arg(long, default_value = "bse-derivatives")]
    left_source: String,
    #[arg(long, default_value = "Futures Turnover (BSE)")]
    left_label: String,
    #[arg(long)]
    right: PathBuf,
    #[arg(long, default_value = "nse-fo")]
    right_source: String,
    #[arg(long, default_value = "Index Options Premium Turnover (NSE)")]
    right_label: String,
    #[arg(long)]
    output: PathBuf,
    #[command(flatten)]
    input_args: InputArgs,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnover=info,turnover_pivot=info,turnover_ingestion=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn delimiter_byte(c: char) -> Result<u8> {
    if !c.is_ascii() {
        bail!("delimiter must be an ASCII character, got {:?}", c);
    }
    Ok(c as u8)
}

fn source_config(preset: &str, args: &InputArgs) -> Result<SourceConfig> {
    let mut source = SourceConfig::preset(preset, args.year)?;
    if args.skip_bad_dates {
        source.date_policy = DatePolicy::Skip;
    }
    Ok(source)
}

fn read_table(path: &Path, args: &InputArgs) -> Result<turnover_ingestion::RawTable> {
    let mut extractor = CsvRowExtractor::new(path).with_delimiter(delimiter_byte(args.delimiter)?);
    fetch_with_retry(&mut extractor, &RetryPolicy::once())
        .with_context(|| format!("reading {}", path.display()))
}

fn run_wide(args: WideArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config {
            source: source_config(&args.source, &args.input_args)?,
            ..Config::default()
        },
    };
    if args.input_args.skip_bad_dates {
        config.source.date_policy = DatePolicy::Skip;
    }
    config.validate()?;

    let table = read_table(&args.input, &args.input_args)?;
    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run_table(&config.source, &table)?;

    let rendered = Table::wide(&report.rows, pipeline.universe(), &config.output);

    if let Some(path) = &args.output {
        CsvSink::create(path)
            .with_context(|| format!("creating {}", path.display()))?
            .write_table(&rendered)?;
    }
    if let Some(path) = &args.sqlite {
        SqliteSink::open(path, &args.sqlite_table)?.write_table(&rendered)?;
    }
    if args.output.is_none() && args.sqlite.is_none() {
        let mut sink = CsvSink::from_writer(std::io::stdout());
        sink.write_table(&rendered)?;
    }

    let quality = QualityReport::from_pipeline(&config.source.name, &report);
    if let Some(path) = &args.quality {
        std::fs::write(path, quality.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    eprintln!("{}", quality.summary());
    info!(rows = rendered.len(), clean = quality.is_clean(), "wide report done");
    Ok(())
}

fn run_combine(args: CombineArgs) -> Result<()> {
    let mut series = Vec::with_capacity(2);
    for (path, preset, label) in [
        (&args.left, &args.left_source, &args.left_label),
        (&args.right, &args.right_source, &args.right_label),
    ] {
        let source = source_config(preset, &args.input_args)?;
        let table = read_table(path, &args.input_args)?;
        let outcome = ObservationBuilder::build_table(&source, &table)
            .with_context(|| format!("ingesting {}", path.display()))?;
        series.push(DailySeries::from_observations(label.as_str(), &outcome.observations));
    }

    let rows = combine_daily(&series[0], &series[1]);
    if rows.is_empty() {
        bail!("no matching dates between {} and {}", series[0].label, series[1].label);
    }

    let table = Table::combined(&rows, &series[0].label, &series[1].label, &OutputConfig::default());
    CsvSink::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?
        .write_table(&table)?;
    info!(rows = table.len(), output = %args.output.display(), "combined report done");
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Wide(args) => run_wide(args),
        Command::Combine(args) => run_combine(args),
    }
}
