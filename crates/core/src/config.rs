//! Application configuration.
//!
//! Values are layered: built-in defaults, then the JSON config file, then
//! `HOSTCART_*` environment variables (`HOSTCART_DATA_DIR=/srv/hostcart`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{persist::DEFAULT_COLLECTION_FILE, query::SortKey};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "hostcart";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "HOSTCART";

/// Fields that may be changed through [`AppConfig::set_field`].
pub const UPDATABLE_FIELDS: [&str; 5] = [
    "data_dir",
    "collection_file",
    "autosave",
    "default_sort",
    "log_dir",
];

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the collection file.
    pub data_dir: PathBuf,
    /// File name of the collection inside `data_dir`.
    pub collection_file: String,
    /// Persist after every change.
    pub autosave: bool,
    /// Ordering used by `list` when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<SortKey>,
    /// Directory for log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            collection_file: DEFAULT_COLLECTION_FILE.to_string(),
            autosave: true,
            default_sort: None,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load using `path` as the config file. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path.as_ref(), environment())
    }

    fn load_with_env(path: &Path, env: Environment) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("failed to build default configuration")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }
        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize configuration")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write config {}", path.display()))
    }

    /// Full path of the collection file.
    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(&self.collection_file)
    }

    /// Update one field from its textual value.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let mut updated = self.clone();
        match key.trim() {
            "data_dir" => updated.data_dir = PathBuf::from(value),
            "collection_file" => updated.collection_file = value.to_string(),
            "autosave" => {
                updated.autosave = match value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    _ => bail!("autosave expects true or false, got '{value}'"),
                }
            }
            "default_sort" => {
                updated.default_sort = match value {
                    "" | "none" => None,
                    other => Some(other.parse::<SortKey>()?),
                }
            }
            "log_dir" => updated.log_dir = PathBuf::from(value),
            other => bail!(
                "field '{other}' is not updatable, allowed fields: {}",
                UPDATABLE_FIELDS.join(", ")
            ),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let name = self.collection_file.trim();
        if name.is_empty() {
            return Err(anyhow!("collection_file must not be empty"));
        }
        if Path::new(name).components().count() != 1 {
            bail!("collection_file must be a plain file name, got '{name}'");
        }
        if self.data_dir.as_os_str().is_empty() {
            bail!("data_dir must not be empty");
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

/// Location of the config file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

/// Default data directory under the user's data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

/// Write a default config file at `path` if none exists yet.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    AppConfig::default().save_to(path)?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}
