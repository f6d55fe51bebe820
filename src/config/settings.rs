//! Application settings.
//!
//! Settings come from two places: `config.toml` (log filter and the categories
//! to seed on first run) and the environment (`DATABASE_URL`, and
//! `ENVELOPE_LEDGER_CONFIG` to point at a different TOML file). A missing
//! `config.toml` is not an error; the defaults are used instead.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

const CONFIG_PATH_VAR: &str = "ENVELOPE_LEDGER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `tracing_subscriber` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Database URL; the `DATABASE_URL` environment variable wins when set
    #[serde(default)]
    pub database_url: Option<String>,
    /// Categories to create if they do not exist yet
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Configuration for a single seeded category
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Name of the category
    pub name: String,
    /// Display colour as `#RRGGBB`
    pub colour: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            database_url: None,
            categories: Vec::new(),
        }
    }
}

impl AppConfig {
    /// The database URL to connect to: environment first, then the file, then the default.
    #[must_use]
    pub fn resolved_database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(crate::config::database::get_database_url)
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the application configuration from `ENVELOPE_LEDGER_CONFIG` or `./config.toml`.
///
/// Falls back to [`AppConfig::default`] when the file does not exist.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if !Path::new(&path).exists() {
        warn!("No configuration file at {path}, using defaults");
        return Ok(AppConfig::default());
    }

    let config = load_config(&path)?;
    info!(
        "Loaded configuration from {path} ({} seed categories)",
        config.categories.len()
    );
    Ok(config)
}
