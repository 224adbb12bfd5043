use anyhow::{bail, Result};
use arrowtrace::{reconstruct, SpanTable};
use clap::Parser;
use cli::display::format_summary;
use cli::{init_tracing, output_path, report_failure, write_document};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Convert one Arrow span batch file to OTLP JSON
#[derive(Parser, Debug)]
#[command(name = "arrow-to-otlp")]
#[command(about = "Convert an Arrow span batch file to OTLP JSON", long_about = None)]
struct Args {
    /// Arrow IPC span batch file
    input: PathBuf,

    /// Output directory (default from configuration: otlp_outputs)
    output_dir: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
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

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&config.output.dir));
    let output = output_path(&args.input, &output_dir)?;

    let table = SpanTable::open(&args.input)?;
    let result = reconstruct(&table, &config.reconstruct_options())?;
    if result.summary.total_traces == 0 {
        bail!("No traces found in {}", args.input.display());
    }

    write_document(&result.document, &output, config.output.pretty)?;
    info!("Converted {} to {}", args.input.display(), output.display());

    println!("{}", format_summary(&result.summary));
    println!("Output: {}", output.display());
    Ok(())
}
