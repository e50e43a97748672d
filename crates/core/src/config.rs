//! Application configuration layered from defaults, a TOML file and the environment.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "gameshelf";
/// Prefix for environment overrides, e.g. `GAMESHELF_DATA_DIR`.
pub const ENV_PREFIX: &str = "GAMESHELF";

const DEFAULT_CONFIG: &str = r#"# GameShelf configuration.

# Directory holding the persisted collection and preferences.
# data_dir = "/path/to/gameshelf"

# Directory where exports are written.
# export_dir = "."
"#;

/// Runtime settings for the collection manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory containing the storage slots.
    pub data_dir: PathBuf,
    /// Directory receiving exported collections.
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the default file location plus environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration using `path` as the optional TOML layer.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .set_default("data_dir", default_data_dir().to_string_lossy().to_string())?
            .set_default("export_dir", ".")?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default directory for the storage slots.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_config_at(&config_path())
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_file() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("missing.toml"))?;
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.export_dir, PathBuf::from("."));
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "data_dir = \"/tmp/shelf\"\nexport_dir = \"/tmp/out\"\n")?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shelf"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        ensure_config_at(&path)?;
        assert!(path.exists());

        fs::write(&path, "export_dir = \"/keep\"\n")?;
        ensure_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "export_dir = \"/keep\"\n");

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.export_dir, PathBuf::from("/keep"));
        Ok(())
    }
}
