//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SPLITSTACK_ROSTER=ana,ben,cleo                                     │
//! │     SPLITSTACK_DB_PATH=/tmp/splitstack.db                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SPLITSTACK_CONFIG, or                                             │
//! │     ~/.config/splitstack/splitstack.toml (Linux)                       │
//! │     ~/Library/Application Support/app.splitstack.splitstack/… (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     empty roster (must be configured), platform data dir database      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # splitstack.toml
//! roster = ["ana", "ben", "cleo"]
//!
//! [database]
//! path = "/home/ana/.local/share/splitstack/splitstack.db"
//! max_connections = 4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use splitstack_core::{Roster, ValidationError};
use splitstack_db::DbConfig;
use thiserror::Error;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "splitstack.toml";
const DATABASE_FILE_NAME: &str = "splitstack.db";

pub const ENV_CONFIG: &str = "SPLITSTACK_CONFIG";
pub const ENV_ROSTER: &str = "SPLITSTACK_ROSTER";
pub const ENV_DB_PATH: &str = "SPLITSTACK_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "SPLITSTACK_DB_MAX_CONNECTIONS";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("No participants configured: set `roster` in {CONFIG_FILE_NAME} or {ENV_ROSTER}")]
    EmptyRoster,

    #[error("Invalid roster: {0}")]
    InvalidRoster(#[from] ValidationError),

    #[error("Could not determine a data directory; set {ENV_DB_PATH}")]
    NoDataDir,
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    4
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// SplitConfig
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Ordered participant names.
    #[serde(default)]
    pub roster: Vec<String>,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl SplitConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$SPLITSTACK_CONFIG`, or the platform default)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path)),
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                path => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies overrides from a variable lookup (the process environment
    /// in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(roster) = lookup(ENV_ROSTER) {
            debug!(roster = %roster, "Overriding roster from environment");
            self.roster = roster
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup(ENV_DB_MAX_CONNECTIONS) {
            self.database.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_DB_MAX_CONNECTIONS.to_string()))?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.roster()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The configured roster.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        Ok(Roster::new(&self.roster)?)
    }

    /// Database location: configured path or the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.database.max_connections))
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("app", "splitstack", "splitstack")
    }
}
