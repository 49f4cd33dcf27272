//! CLI Tooling
//!
//! Command-line interface over a file-backed registry. Each invocation discovers the units
//! under the configured root, registers them and runs one command.

use crate::config::{ConfigLoader, HotloadConfig};
use crate::error::{ApiError, ReloadError};
use crate::loader::{FileUnit, FileUnitLoader};
use crate::registry::Registry;
use crate::tooling::format::{
    format_history_text, format_record_line, format_status_text, to_json,
};
use crate::types::{RecordErrorKind, ReloadRecord};
use crate::watch::WatchDaemon;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Hotload CLI - reload file-backed units without restarting
#[derive(Parser)]
#[command(name = "hotload")]
#[command(about = "Concurrent hot-reload registry for file-backed units")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show registered units and reload totals
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Reload one unit
    Reload {
        /// Unit name
        name: String,
        /// Bypass the debounce window
        #[arg(long)]
        force: bool,
    },
    /// Reload every registered unit
    ReloadAll {
        /// Bypass the debounce window
        #[arg(long)]
        force: bool,
    },
    /// Show the reload history of this invocation
    History {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Watch the unit root and reload units as their files change
    Watch {
        /// Debounce window in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Batch window in milliseconds
        #[arg(long)]
        batch_window_ms: Option<u64>,
    },
}

/// CLI context: loaded configuration plus the registry built from it.
pub struct CliContext {
    config: HotloadConfig,
    loader: FileUnitLoader,
    registry: Arc<Registry<FileUnit>>,
}

impl CliContext {
    /// Load configuration, then build and populate the registry.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = Self::load_config(&workspace_root, config_path.as_deref())?;
        Self::from_config(&workspace_root, config)
    }

    /// Load configuration from `config_path` if given, otherwise the layered sources.
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<HotloadConfig, ApiError> {
        match config_path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(workspace_root),
        }
    }

    pub fn from_config(workspace_root: &Path, config: HotloadConfig) -> Result<Self, ApiError> {
        let unit_root = config.units.resolve_root(workspace_root);
        let loader = FileUnitLoader::new(unit_root, config.units.extension.clone());
        let registry = Arc::new(Registry::new(loader.clone(), config.registry.clone()));

        // A broken unit should not stop the others from being served
        for name in loader.discover()? {
            if let Err(e) = registry.register(&name) {
                warn!(unit = %name, error = %e, "Skipping unit that failed to load");
            }
        }
        info!(root = ?loader.root(), units = registry.len(), "Registry ready");

        Ok(Self {
            config,
            loader,
            registry,
        })
    }

    pub fn config(&self) -> &HotloadConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry<FileUnit>> {
        &self.registry
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Status { format } => {
                let status = self.registry.status();
                match format.as_str() {
                    "json" => to_json(&status),
                    "text" => Ok(format_status_text(&status)),
                    other => Err(unknown_format(other)),
                }
            }
            Commands::Reload { name, force } => {
                let record = self.registry.reload(name, *force);
                match record.error_kind() {
                    Some(RecordErrorKind::NotRegistered) => {
                        Err(ApiError::UnknownUnit(name.clone()))
                    }
                    Some(RecordErrorKind::Debounced) => {
                        Err(ApiError::Reload(ReloadError::Debounced(name.clone())))
                    }
                    Some(RecordErrorKind::Load) => Err(ApiError::Reload(ReloadError::Load(
                        record.error.unwrap_or_default(),
                    ))),
                    None => Ok(format_record_line(&record)),
                }
            }
            Commands::ReloadAll { force } => {
                let records = self.registry.reload_all(*force);
                Ok(format_records(&records))
            }
            Commands::History { format } => {
                let history = self.registry.history();
                match format.as_str() {
                    "json" => to_json(&history),
                    "text" => Ok(format_history_text(&history)),
                    other => Err(unknown_format(other)),
                }
            }
            Commands::Watch {
                debounce_ms,
                batch_window_ms,
            } => self.watch(*debounce_ms, *batch_window_ms),
        }
    }

    fn watch(
        &self,
        debounce_ms: Option<u64>,
        batch_window_ms: Option<u64>,
    ) -> Result<String, ApiError> {
        let mut settings = self.config.watch.clone();
        if let Some(ms) = debounce_ms {
            settings.debounce_ms = ms;
        }
        if let Some(ms) = batch_window_ms {
            settings.batch_window_ms = ms;
        }
        settings.validate()?;

        self.registry
            .on_reload(|unit: &str, success: bool, error: Option<&str>| {
                if success {
                    println!("reloaded {}", unit);
                } else {
                    println!("failed {}: {}", unit, error.unwrap_or("unknown error"));
                }
            });

        let namer_loader = self.loader.clone();
        let daemon = WatchDaemon::new(
            Arc::clone(&self.registry),
            self.loader.root().to_path_buf(),
            settings,
        )
        .with_namer(Box::new(move |path: &Path| namer_loader.name_for(path)));

        println!("Watching {} (units: {})", self.loader.root().display(), self.registry.len());
        daemon.start()?;

        Ok(format_history_text(&self.registry.history()))
    }
}

fn format_records(records: &[ReloadRecord]) -> String {
    if records.is_empty() {
        return "No units registered.".to_string();
    }
    let lines: Vec<String> = records.iter().map(format_record_line).collect();
    let failed = records.iter().filter(|r| !r.success).count();
    format!(
        "{}\n\n{} reloaded, {} failed",
        lines.join("\n"),
        records.len() - failed,
        failed
    )
}

fn unknown_format(format: &str) -> ApiError {
    ApiError::ConfigError(format!(
        "Unknown output format '{}', expected 'text' or 'json'",
        format
    ))
}
