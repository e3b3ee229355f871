use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::format::OutputFormat;
use crate::walker::DEFAULT_BATCH_SIZE;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Write logs to a daily rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// The configuration for reading topics.
pub struct ReaderConfig {
    /// Location of the database holding topic metadata and segments.
    pub data_directory: PathBuf,
    /// Maximum number of entries read from a segment at once.
    pub batch_size: u64,
    /// Ask the operator whether to continue after every batch.
    pub interactive: bool,
    pub format: OutputFormat,
    pub log: LogConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            data_directory: PathBuf::from("data"),
            batch_size: DEFAULT_BATCH_SIZE,
            interactive: true,
            format: OutputFormat::Text,
            log: LogConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Loads the configuration from an optional file, then `JOSEFINE_` prefixed environment
    /// variables (`JOSEFINE_LOG__LEVEL=debug` sets `log.level`).
    pub fn config(config_path: Option<&Path>) -> Result<ReaderConfig> {
        let mut settings = config::Config::builder();
        if let Some(path) = config_path {
            settings = settings.add_source(config::File::from(path));
        }
        let config = settings
            .add_source(
                config::Environment::with_prefix("JOSEFINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validates the configuration, ensuring all values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("batch size cannot be 0"));
        }
        if self.data_directory.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("data directory cannot be empty"));
        }
        Ok(())
    }
}
