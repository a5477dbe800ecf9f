use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use crate::services::validate_percentage;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
pub const DEFAULT_DATABASE_PATH: &str = "bestellverwaltung.db";
pub const DEFAULT_LOG_FILE: &str = "bestellverwaltung.log";
pub const DEFAULT_BACKUP_KEEP: usize = 14;
pub const DEFAULT_VAT_RATE: f64 = 19.0;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 6;
const DEFAULT_CONNECT_RETRY_SECS: u64 = 1;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Path of the SQLite database file
    #[validate(length(min = 1))]
    pub database_path: String,

    /// Append-only application log file; empty disables file logging
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also log to stderr
    #[serde(default)]
    pub log_stderr: bool,

    /// Directory receiving backup snapshots
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Number of scheduled backups to retain
    #[serde(default = "default_backup_keep")]
    pub backup_keep: usize,

    /// VAT rate in percent applied to new orders
    #[serde(default = "default_vat_rate")]
    #[validate(custom = "validate_percentage")]
    pub default_vat_rate: f64,

    /// Fill a newly created database with sample data
    #[serde(default = "default_true_bool")]
    pub seed_sample_data: bool,

    /// Connection attempts before giving up on a locked database
    #[serde(default = "default_connect_attempts")]
    #[validate(range(min = 1, max = 60))]
    pub db_connect_attempts: u32,

    /// Pause between connection attempts (seconds)
    #[serde(default = "default_connect_retry_secs")]
    pub db_connect_retry_secs: u64,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl AppConfig {
    /// Builds a configuration with defaults for everything but the database
    /// path. Used by tests and tools that bypass the layered loader.
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            log_stderr: false,
            backup_dir: default_backup_dir(),
            backup_keep: default_backup_keep(),
            default_vat_rate: default_vat_rate(),
            seed_sample_data: true,
            db_connect_attempts: default_connect_attempts(),
            db_connect_retry_secs: default_connect_retry_secs(),
            environment: default_environment(),
        }
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database_path)
    }

    pub fn backup_dir(&self) -> PathBuf {
        PathBuf::from(&self.backup_dir)
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Log file path, if file logging is enabled
    pub fn log_file(&self) -> Option<&Path> {
        if self.log_file.trim().is_empty() {
            None
        } else {
            Some(Path::new(&self.log_file))
        }
    }

    /// Replaces the database path, e.g. from a `--database` flag.
    pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.database_path = path.to_string_lossy().into_owned();
        }
        self
    }
}

/// Custom error type for configuration loading
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

fn default_backup_dir() -> String {
    ".".to_string()
}

fn default_backup_keep() -> usize {
    DEFAULT_BACKUP_KEEP
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

fn default_true_bool() -> bool {
    true
}

fn default_connect_attempts() -> u32 {
    DEFAULT_CONNECT_ATTEMPTS
}

fn default_connect_retry_secs() -> u64 {
    DEFAULT_CONNECT_RETRY_SECS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

/// Initializes tracing. Events go to the append-only log file when one is
/// configured, and additionally to stderr when `stderr` is set.
pub fn init_tracing(level: &str, log_file: Option<&Path>, stderr: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // The binaries log under their own crate names, so the level applies to
    // every target except the database crates.
    let default_directive = format!("{},sea_orm=warn,sqlx=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Arc::new(file)),
            Err(err) => {
                eprintln!("Cannot open log file {}: {}", path.display(), err);
                None
            }
        }
    });
    let file_missing = log_file.is_some() && file.is_none();

    let file_layer = file.map(|file| fmt::layer().with_ansi(false).with_writer(file));
    // Fall back to stderr rather than losing events when the file is unusable.
    let stderr_layer = (stderr || file_missing).then(|| fmt::layer().with_writer(std::io::stderr));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter_directive))
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}

/// Something noticed while loading the configuration. Loading happens
/// before tracing is set up, so notices are handed to the caller and logged
/// with [`log_notices`] once the subscriber is in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    Info(String),
    Warn(String),
}

/// Emits the notices collected by [`load_config`].
pub fn log_notices(notices: &[ConfigNotice]) {
    for notice in notices {
        match notice {
            ConfigNotice::Info(msg) => info!("{}", msg),
            ConfigNotice::Warn(msg) => warn!("{}", msg),
        }
    }
}

/// Notices about settings that are valid but worth reporting.
pub fn review_config(config: &AppConfig) -> Vec<ConfigNotice> {
    let mut notices = Vec::new();
    if config.backup_keep == 0 {
        notices.push(ConfigNotice::Warn(
            "backup_keep is 0; scheduled backups will never be pruned".to_string(),
        ));
    }
    notices
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
///
/// Returns the configuration together with the notices to log once tracing
/// is initialized. Validation failures are returned as errors.
pub fn load_config() -> Result<(AppConfig, Vec<ConfigNotice>), AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut notices = Vec::new();
    if !Path::new(CONFIG_DIR).exists() {
        notices.push(ConfigNotice::Info(format!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        )));
    }

    let config = Config::builder()
        .set_default("database_path", DEFAULT_DATABASE_PATH)?
        .set_default("environment", run_env.as_str())?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    notices.extend(review_config(&app_config));
    Ok((app_config, notices))
}
