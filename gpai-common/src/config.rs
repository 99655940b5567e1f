//! Configuration loading and root folder resolution

use crate::models::GpaPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GPAI_ROOT_FOLDER";

/// How reload results are reconciled into the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Every reload publishes when it resolves; the last to resolve wins
    #[default]
    LastReloadWins,
    /// Reloads are stamped when their read starts; older results are discarded
    Stamped,
}

/// Synchronizer settings (`[sync]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub reconcile: ReconcileMode,
    /// Event bus buffer size
    pub event_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { reconcile: ReconcileMode::default(), event_capacity: 100 }
    }
}

/// Contents of `config.toml`
///
/// ```toml
/// root_folder = "/srv/gpai"
/// database_file = "gpai.db"
///
/// [gpa]
/// cap = "capped"          # or "uncapped"
/// graded = "letter_range" # or "classified"
///
/// [sync]
/// reconcile = "last_reload_wins" # or "stamped"
/// event_capacity = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpaiConfig {
    pub root_folder: Option<PathBuf>,
    pub database_file: String,
    pub gpa: GpaPolicy,
    pub sync: SyncSettings,
}

impl Default for GpaiConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_file: "gpai.db".to_string(),
            gpa: GpaPolicy::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl GpaiConfig {
    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GpaiConfig = toml::from_str(content)?;
        if config.database_file.trim().is_empty() {
            return Err(Error::Config("database_file must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Load config from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load config from `explicit` if given, else the platform config file,
    /// else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match find_config_file() {
            Ok(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Path of the database file under `root_folder`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.database_file)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config: Option<&GpaiConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = config.and_then(|c| c.root_folder.as_ref()) {
        return root_folder.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Get configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/gpai/config.toml first, then /etc/gpai/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("gpai").join("config.toml"));
        let system_config = PathBuf::from("/etc/gpai/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("gpai").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gpai"))
        .unwrap_or_else(|| PathBuf::from("./gpai_data"))
}
