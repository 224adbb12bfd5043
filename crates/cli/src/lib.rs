//! Shared plumbing for the `arrowtrace` and `arrow-to-otlp` binaries

pub mod display;

use anyhow::{Context, Result};
use arrowtrace::{write_otlp_json, ArrowTraceError, TracesDocument};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// Suffix appended to the input file stem for converted output
pub const OUTPUT_SUFFIX: &str = "otlp.json";

/// Installs the fmt subscriber on stderr so stdout stays free for data
///
/// Set RUST_LOG to control the level, e.g. RUST_LOG=debug.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Maps a failure to the process exit status
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ArrowTraceError>() {
        Some(ArrowTraceError::NotFound(_)) => 2,
        Some(ArrowTraceError::SchemaMismatch { .. }) => 3,
        Some(ArrowTraceError::PayloadDecode { .. }) => 4,
        Some(ArrowTraceError::EmptyTable) => 5,
        _ => 1,
    }
}

/// Logs a failure once through the stderr subscriber and returns its exit status
pub fn report_failure(err: &anyhow::Error) -> ExitCode {
    error!("{:#}", err);
    ExitCode::from(exit_status(err))
}

/// `<output_dir>/<input stem>.otlp.json`
pub fn output_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .with_context(|| format!("Input path has no file name: {}", input.display()))?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(OUTPUT_SUFFIX);
    Ok(output_dir.join(name))
}

/// Writes the export tree to `path`, creating parent directories
pub fn write_document(document: &TracesDocument, path: &Path, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_otlp_json(document, BufWriter::new(file), pretty)?;
    Ok(())
}
