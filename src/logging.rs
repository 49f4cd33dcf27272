//! Logging System
//!
//! Structured logging using the `tracing` crate. Level, format and destination come
//! from [`LoggingConfig`]; `HOTLOAD_LOG*` environment variables take precedence over it.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

const ENV_FILTER: &str = "HOTLOAD_LOG";
const ENV_FORMAT: &str = "HOTLOAD_LOG_FORMAT";
const ENV_OUTPUT: &str = "HOTLOAD_LOG_OUTPUT";
const ENV_MODULES: &str = "HOTLOAD_LOG_MODULES";
const ENV_FILE: &str = "HOTLOAD_LOG_FILE";

/// Line format of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[default]
    #[serde(rename = "stderr")]
    Stderr,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    #[serde(rename = "both")]
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::Both),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                other
            ))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::Both => "both",
        };
        f.write_str(s)
    }
}

/// Logging configuration, the `[logging]` table of `hotload.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,

    /// Base filter: trace, debug, info, warn, error, off
    pub level: String,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file when output includes a file; the platform state dir is used otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// ANSI colors for text output to a terminal
    pub color: bool,

    /// Per-target levels, e.g. `"hotload::watch" = "debug"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Layer command-line flags over the loaded configuration.
    pub fn with_overrides(
        mut self,
        level: Option<String>,
        format: Option<String>,
        output: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        if let Some(output) = output {
            self.output = output.parse()?;
        }
        if file.is_some() {
            self.file = file;
        }
        Ok(self)
    }

    /// Apply `HOTLOAD_LOG_FORMAT` / `HOTLOAD_LOG_OUTPUT` / `HOTLOAD_LOG_FILE`.
    fn with_env(mut self) -> Result<Self, ApiError> {
        if let Some(format) = env_value(ENV_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(output) = env_value(ENV_OUTPUT) {
            self.output = output.parse()?;
        }
        if let Some(file) = env_value(ENV_FILE) {
            self.file = Some(PathBuf::from(file));
        }
        Ok(self)
    }

    /// Filter from `HOTLOAD_LOG` when set, otherwise level plus module directives.
    fn env_filter(&self) -> Result<EnvFilter, ApiError> {
        if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
            return Ok(filter);
        }
        if self.level == "off" {
            return Ok(EnvFilter::new("off"));
        }

        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| ApiError::ConfigError(format!("Invalid log level {}: {}", self.level, e)))?;
        for (target, level) in &self.modules {
            filter = filter.add_directive(module_directive(target, level)?);
        }
        if let Some(spec) = env_value(ENV_MODULES) {
            for (target, level) in spec.split(',').filter_map(|pair| pair.split_once('=')) {
                filter = filter.add_directive(module_directive(target.trim(), level.trim())?);
            }
        }
        Ok(filter)
    }

    fn writer(&self) -> Result<BoxMakeWriter, ApiError> {
        let writer = match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
            LogOutput::File | LogOutput::FileAndStderr => {
                let path = resolve_log_file_path(None, self.file.clone())?;
                let file = Mutex::new(open_log_file(&path)?);
                if self.output == LogOutput::FileAndStderr {
                    BoxMakeWriter::new(file.and(std::io::stderr))
                } else {
                    BoxMakeWriter::new(file)
                }
            }
        };
        Ok(writer)
    }
}

/// Log file with precedence: CLI flag, `HOTLOAD_LOG_FILE`, config, platform default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let explicit = cli_file
        .into_iter()
        .chain(env_value(ENV_FILE).map(PathBuf::from))
        .chain(config_file)
        .find(|p| !p.as_os_str().is_empty());
    match explicit {
        Some(path) => Ok(path),
        None => default_log_file_path(),
    }
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let dirs = directories::ProjectDirs::from("", "hotload", "hotload").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories for log file".to_string())
    })?;
    // state_dir only exists on Linux
    let dir = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(dir.join("hotload.log"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let config = config.cloned().unwrap_or_default();
    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(init_error);
    }

    let config = config.with_env()?;
    let filter = config.env_filter()?;
    let writer = config.writer()?;

    let layer: BoxedLayer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(config.color && !config.output.writes_file())
            .with_writer(writer)
            .boxed(),
    };

    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(init_error)
}

fn init_error(e: impl fmt::Display) -> ApiError {
    ApiError::ConfigError(format!("Failed to initialize logging: {}", e))
}

fn open_log_file(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {}: {}", path.display(), e)))
}

fn module_directive(target: &str, level: &str) -> Result<Directive, ApiError> {
    format!("{}={}", target, level)
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive for {}: {}", target, e)))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
