use anyhow::{Context, Result};
use arrowtrace::{
    compute_statistics, group_by_trace, payloads, reconstruct, stream_batches, training_examples,
    unique_span_names, write_jsonl, SpanTable,
};
use clap::{Parser, Subcommand};
use cli::display::{
    format_rows, format_schema, format_span_structure, format_statistics, format_summary,
    format_trace_preview,
};
use cli::{init_tracing, report_failure, write_document};
use config::Config;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Rows shown by `load`, traces shown by `load-otlp`
const PREVIEW_LIMIT: usize = 5;

/// Span names shown per trace by `load-otlp`
const PREVIEW_SPAN_NAMES: usize = 3;

/// Span batch file utilities
#[derive(Parser, Debug)]
#[command(name = "arrowtrace")]
#[command(about = "Inspect and convert Arrow span batch files", long_about = None)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one file and show its first span payload
    ShowOtlp { file: PathBuf },
    /// Group one file by trace and preview the first traces
    LoadOtlp { file: PathBuf },
    /// Convert every file matching a pattern into one OTLP JSON document
    ToOtlpJson { pattern: String, output: PathBuf },
    /// Show span statistics for one file
    Stats { file: PathBuf },
    /// Load every file matching a pattern and preview the combined table
    Load { pattern: String },
    /// Write one training example per trace as JSON lines
    ToJsonl { file: PathBuf, output: PathBuf },
    /// List distinct span names
    Names {
        file: PathBuf,
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Stream decoded payload batches and report their sizes
    Stream {
        pattern: String,
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    config.validate()?;

    match args.command {
        Command::ShowOtlp { file } => show_otlp(&config, &file),
        Command::LoadOtlp { file } => load_otlp(&config, &file),
        Command::ToOtlpJson { pattern, output } => to_otlp_json(&config, &pattern, &output),
        Command::Stats { file } => stats(&config, &file),
        Command::Load { pattern } => load(&pattern),
        Command::ToJsonl { file, output } => to_jsonl(&config, &file, &output),
        Command::Names { file, limit } => names(&file, limit),
        Command::Stream {
            pattern,
            batch_size,
        } => stream(&config, &pattern, batch_size),
    }
}

fn show_otlp(config: &Config, file: &Path) -> Result<()> {
    let table = SpanTable::open(file)?;
    let spans = payloads(&table, &config.reconstruct_options())?;
    println!("Loaded {} spans", spans.len());

    let Some(first) = spans.first() else {
        println!("No spans found");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(first)?);
    println!("{}", format_span_structure(first));
    Ok(())
}

fn load_otlp(config: &Config, file: &Path) -> Result<()> {
    let table = SpanTable::open(file)?;
    let groups = group_by_trace(&table, &config.reconstruct_options())?;
    println!(
        "Loaded {} traces ({} spans)",
        groups.len(),
        groups.total_spans()
    );

    if !groups.is_empty() {
        println!(
            "{}",
            format_trace_preview(&groups, PREVIEW_LIMIT, PREVIEW_SPAN_NAMES)
        );
    }
    Ok(())
}

fn to_otlp_json(config: &Config, pattern: &str, output: &Path) -> Result<()> {
    let table = SpanTable::load_all(pattern)?;
    let result = reconstruct(&table, &config.reconstruct_options())?;
    write_document(&result.document, output, config.output.pretty)?;

    info!("Wrote {}", output.display());
    println!("{}", format_summary(&result.summary));
    Ok(())
}

fn stats(config: &Config, file: &Path) -> Result<()> {
    let table = SpanTable::open(file)?;
    let stats = compute_statistics(&table, &config.reconstruct_options())
        .with_context(|| format!("Failed to compute statistics for {}", file.display()))?;
    println!("{}", format_statistics(&stats));
    Ok(())
}

fn load(pattern: &str) -> Result<()> {
    let table = SpanTable::load_all(pattern)?;
    println!("Loaded {} spans", table.num_rows());
    println!("{}", format_schema(&table));
    println!("{}", format_rows(&table, PREVIEW_LIMIT)?);
    Ok(())
}

fn to_jsonl(config: &Config, file: &Path, output: &Path) -> Result<()> {
    let table = SpanTable::open(file)?;
    let examples = training_examples(&table, &config.reconstruct_options())?;

    let writer = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let written = write_jsonl(&examples, BufWriter::new(writer))?;

    info!("Wrote {} training examples to {}", written, output.display());
    println!("Wrote {} training examples", written);
    Ok(())
}

fn names(file: &Path, limit: usize) -> Result<()> {
    let table = SpanTable::open(file)?;
    for name in unique_span_names(&table, limit)? {
        println!("{}", name);
    }
    Ok(())
}

fn stream(config: &Config, pattern: &str, batch_size: Option<usize>) -> Result<()> {
    let batch_size = batch_size.unwrap_or(config.stream.batch_size);
    let mut batches = stream_batches(pattern, batch_size, &config.stream_options())?;

    let mut total = 0;
    let mut count = 0;
    for batch in batches.by_ref() {
        let batch = batch?;
        count += 1;
        total += batch.len();
        println!("batch {}: {} spans", count, batch.len());
    }

    println!(
        "Streamed {} spans in {} batches ({} rows skipped)",
        total,
        count,
        batches.skipped()
    );
    Ok(())
}
