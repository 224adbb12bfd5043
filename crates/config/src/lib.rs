use anyhow::{Context, Result};
use arrowtrace::options::{
    DEFAULT_PAYLOAD_COLUMNS, DEFAULT_SERVICE_NAME, DEFAULT_STREAM_BATCH_SIZE, ROOT_PARENT_SENTINEL,
};
use arrowtrace::{DecodePolicy, ReconstructOptions};
use config_rs::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `ARROWTRACE_STREAM__BATCH_SIZE=64`
pub const ENV_PREFIX: &str = "ARROWTRACE";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// How span rows are turned into the export tree
    #[serde(default)]
    pub reconstruct: ReconstructConfig,

    /// Streaming batch settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Where and how output files are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration for trace reconstruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructConfig {
    /// Service label for rows without a service name (default: "unknown")
    #[serde(default = "default_service_name")]
    pub default_service_name: String,

    /// `parent_span_id` value marking a root span (default: empty string)
    #[serde(default = "default_root_parent_sentinel")]
    pub root_parent_sentinel: String,

    /// Payload columns tried in order (default: otlp_span, attributes_json)
    #[serde(default = "default_payload_columns")]
    pub payload_columns: Vec<String>,

    /// Behavior on an undecodable payload (default: abort)
    #[serde(default)]
    pub decode_policy: DecodePolicy,
}

/// Configuration for streaming payload batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Payloads per batch (default: 32)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Behavior on an undecodable payload (default: skip)
    #[serde(default = "default_stream_decode_policy")]
    pub decode_policy: DecodePolicy,
}

/// Configuration for written output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for converted files (default: "otlp_outputs")
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Indent JSON output (default: true)
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

// Default value functions
fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_root_parent_sentinel() -> String {
    ROOT_PARENT_SENTINEL.to_string()
}

fn default_payload_columns() -> Vec<String> {
    DEFAULT_PAYLOAD_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_batch_size() -> usize {
    DEFAULT_STREAM_BATCH_SIZE
}

fn default_stream_decode_policy() -> DecodePolicy {
    DecodePolicy::Skip
}

fn default_output_dir() -> String {
    "otlp_outputs".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            default_service_name: default_service_name(),
            root_parent_sentinel: default_root_parent_sentinel(),
            payload_columns: default_payload_columns(),
            decode_policy: DecodePolicy::Abort,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            decode_policy: default_stream_decode_policy(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Load Config with layered configuration priority:
    /// 1. Default values
    /// 2. TOML file (if provided)
    /// 3. Environment variables (ARROWTRACE_ prefix, `__` between section and key)
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            // Reconstruction defaults
            .set_default("reconstruct.default_service_name", DEFAULT_SERVICE_NAME)?
            .set_default("reconstruct.root_parent_sentinel", ROOT_PARENT_SENTINEL)?
            .set_default("reconstruct.payload_columns", default_payload_columns())?
            .set_default("reconstruct.decode_policy", "abort")?
            // Streaming defaults
            .set_default("stream.batch_size", DEFAULT_STREAM_BATCH_SIZE as u64)?
            .set_default("stream.decode_policy", "skip")?
            // Output defaults
            .set_default("output.dir", default_output_dir())?
            .set_default("output.pretty", true)?;

        if let Some(file_path) = config_file {
            let path = Path::new(file_path);
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("reconstruct.payload_columns")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let app_config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Load Config from a TOML file; environment variables still override it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = path
            .to_str()
            .with_context(|| format!("Configuration path is not UTF-8: {}", path.display()))?;
        Self::load(Some(path))
    }

    /// Create a new Config from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.reconstruct.validate()?;
        self.stream.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Options for conversion and the other whole-table operations
    pub fn reconstruct_options(&self) -> ReconstructOptions {
        ReconstructOptions {
            default_service_name: self.reconstruct.default_service_name.clone(),
            root_parent_sentinel: self.reconstruct.root_parent_sentinel.clone(),
            payload_columns: self.reconstruct.payload_columns.clone(),
            decode_policy: self.reconstruct.decode_policy,
        }
    }

    /// Options for streaming, which carries its own decode policy
    pub fn stream_options(&self) -> ReconstructOptions {
        self.reconstruct_options()
            .with_decode_policy(self.stream.decode_policy)
    }
}

impl ReconstructConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.payload_columns.is_empty(),
            "At least one payload column must be configured"
        );
        anyhow::ensure!(
            self.payload_columns.iter().all(|c| !c.is_empty()),
            "Payload column names cannot be empty"
        );
        Ok(())
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.batch_size > 0, "Stream batch size must be positive");
        Ok(())
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.dir.is_empty(), "Output directory cannot be empty");
        Ok(())
    }
}
