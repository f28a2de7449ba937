//! Configuration for shelfmark paths and logging.
//!
//! Configuration sources (highest priority first):
//! 1. `--catalog` flag / `SHELFMARK_CATALOG` (catalog path only, applied by the CLI)
//! 2. Environment variable `SHELFMARK_HOME`
//! 3. Config file (.shelfmark/config.yaml)
//! 4. Defaults (~/.shelfmark)
//!
//! Config file discovery:
//! - Searches current directory and parents for .shelfmark/config.yaml
//! - Relative paths in the config file are resolved against the directory
//!   that contains `.shelfmark/`

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Directory name holding the config file and default state
pub const CONFIG_DIR_NAME: &str = ".shelfmark";

const CATALOG_FILE_NAME: &str = "catalog.json";
const LOG_FILE_NAME: &str = "shelfmark.log";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory
    pub home: Option<String>,
    /// Catalog snapshot file
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: Option<String>,
    /// Log file; an empty string disables file logging
    pub file: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Catalog snapshot file
    pub catalog: PathBuf,
    /// Appending log file (None disables file logging)
    pub log_file: Option<PathBuf>,
    /// Default log filter
    pub log_level: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Replace the catalog path when one was given on the command line
    pub fn with_catalog_override(mut self, catalog: Option<PathBuf>) -> Self {
        if let Some(catalog) = catalog {
            self.catalog = catalog;
        }
        self
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR_NAME).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Resolve configuration starting the config file search at `start_dir`.
/// `env` looks up environment variables; `user_home` is the fallback base.
fn resolve_config(
    start_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
    user_home: &Path,
) -> Result<ResolvedConfig> {
    let default_home = user_home.join(CONFIG_DIR_NAME);
    let config_file = find_config_file(start_dir);

    let config = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    // The directory that contains .shelfmark/
    let base_dir = config_file
        .as_deref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."));

    let paths = config.as_ref().map(|c| c.paths.clone()).unwrap_or_default();
    let logging = config.as_ref().and_then(|c| c.logging.clone());

    let home = if let Some(env_home) = env("SHELFMARK_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(base_dir, home_path)
    } else if config_file.is_some() {
        base_dir.join(CONFIG_DIR_NAME)
    } else {
        default_home
    };

    let catalog = paths
        .catalog
        .as_deref()
        .map(|p| resolve_path(base_dir, p))
        .unwrap_or_else(|| home.join(CATALOG_FILE_NAME));

    let log_file = match logging.as_ref().and_then(|l| l.file.as_deref()) {
        Some("") => None,
        Some(file) => Some(resolve_path(base_dir, file)),
        None => Some(home.join(LOG_FILE_NAME)),
    };

    let log_level = logging
        .and_then(|l| l.level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(ResolvedConfig {
        home,
        catalog,
        log_file,
        log_level,
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let user_home = dirs::home_dir().context("Failed to determine home directory")?;
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    resolve_config(&cwd, |key| std::env::var(key).ok(), &user_home)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
