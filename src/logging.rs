//! Structured logging through `tracing`.
//!
//! The subscriber is configured from [`LoggingConfig`]. `PKGIO_LOG` replaces the
//! whole filter when set; `PKGIO_LOG_FORMAT`, `PKGIO_LOG_OUTPUT`, and
//! `PKGIO_LOG_MODULES` override single fields. Logs go to stderr unless told
//! otherwise, since stdout carries command output.

use crate::error::PackageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const FILTER_ENV: &str = "PKGIO_LOG";
const MODULES_ENV: &str = "PKGIO_LOG_MODULES";
const FORMAT_ENV: &str = "PKGIO_LOG_FORMAT";
const OUTPUT_ENV: &str = "PKGIO_LOG_OUTPUT";

/// Line format of emitted events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(PackageError::Config(format!(
                "Invalid log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Destination of emitted events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(PackageError::Config(format!(
                "Invalid log output '{}' (expected stdout, stderr, or file)",
                other
            ))),
        }
    }
}

/// Logging configuration, the `[logging]` table of the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level: trace, debug, info, warn, error, off
    pub level: String,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file used when `output` is `file`
    pub file: PathBuf,

    /// ANSI colors for text output on a terminal stream
    pub color: bool,

    /// Per-module levels, e.g. `pkgio::tree = "debug"`
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: PathBuf::from("pkgio.log"),
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Apply the `PKGIO_LOG_FORMAT`, `PKGIO_LOG_OUTPUT`, and `PKGIO_LOG_MODULES` overrides.
    pub fn with_env_overrides(mut self) -> Result<Self, PackageError> {
        if let Ok(format) = std::env::var(FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Ok(output) = std::env::var(OUTPUT_ENV) {
            self.output = output.parse()?;
        }
        if let Ok(modules) = std::env::var(MODULES_ENV) {
            self.modules.extend(parse_module_levels(&modules));
        }
        Ok(self)
    }

    /// Filter directives for this configuration: the default level, then one per module.
    pub fn directives(&self) -> Vec<String> {
        let mut directives = vec![self.level.clone()];
        if self.level != "off" {
            directives.extend(
                self.modules
                    .iter()
                    .map(|(module, level)| format!("{}={}", module, level)),
            );
        }
        directives
    }

    fn env_filter(&self) -> Result<EnvFilter, PackageError> {
        if let Ok(filter) = EnvFilter::try_from_env(FILTER_ENV) {
            return Ok(filter);
        }
        EnvFilter::try_new(self.directives().join(","))
            .map_err(|e| PackageError::Config(format!("Invalid log directive: {}", e)))
    }

    fn make_writer(&self) -> Result<BoxMakeWriter, PackageError> {
        Ok(match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => {
                if let Some(dir) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(dir).map_err(|e| {
                        PackageError::Config(format!(
                            "Failed to create log directory {}: {}",
                            dir.display(),
                            e
                        ))
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.file)
                    .map_err(|e| {
                        PackageError::Config(format!(
                            "Failed to open log file {}: {}",
                            self.file.display(),
                            e
                        ))
                    })?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }
}

/// `module=level` pairs separated by commas; malformed entries are skipped.
fn parse_module_levels(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            if module.is_empty() || level.is_empty() {
                return None;
            }
            Some((module.to_string(), level.to_string()))
        })
        .collect()
}

/// Install the global subscriber.
///
/// Fails when a subscriber is already installed or the configuration is invalid.
pub fn init_logging(config: &LoggingConfig) -> Result<(), PackageError> {
    let config = config.clone().with_env_overrides()?;
    let filter = config.env_filter()?;
    let ansi = config.color && config.output != LogOutput::File;

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(config.make_writer()?);
    let registry = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Text => registry.with(layer.with_ansi(ansi)).try_init(),
    };
    installed.map_err(|e| PackageError::Config(format!("Failed to initialize logging: {}", e)))
}
