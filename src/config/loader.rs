//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (<user config dir>/srsmith/config.toml)
//! 3. Project config (.srsmith/config.toml)
//! 4. Environment variables (SRSMITH_* prefix, `__` separates sections)
//!
//! The API key additionally falls back to `SRSMITH_API_KEY` and then
//! `OPENAI_API_KEY` when no layer sets `llm.api_key`.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SrsError};

/// Environment variables consulted for the API key, in order
const API_KEY_VARS: [&str; 2] = ["SRSMITH_API_KEY", "OPENAI_API_KEY"];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            Some(&Self::project_config_path()),
        )
    }

    /// Load with explicit global/project files (missing files are skipped)
    pub fn load_layers(global: Option<&Path>, project: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project_path) = project
            && project_path.exists()
        {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(project_path));
        }

        // e.g. SRSMITH_LLM__MODEL -> llm.model, SRSMITH_RATE_LIMIT__MAX_REQUESTS -> rate_limit.max_requests
        figment = figment.merge(Env::prefixed("SRSMITH_").split("__").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| SrsError::Config(format!("Configuration error: {}", e)))?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = Self::api_key_from_env();
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(SrsError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| SrsError::Config(format!("Configuration error: {}", e)))?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = Self::api_key_from_env();
        }

        config.validate()?;
        Ok(config)
    }

    fn api_key_from_env() -> Option<String> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (platform config dir + `srsmith`)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "srsmith").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".srsmith")
    }

    /// Project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global config
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            SrsError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Write the default project config under `.srsmith/`
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::write_default(&Self::project_dir(), force)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML). The API key is never written to disk.
    fn default_config_toml() -> String {
        r#"# srsmith configuration
# Project settings in .srsmith/config.toml override the global file.
# The API key is read from SRSMITH_API_KEY or OPENAI_API_KEY.

version = "1.0"

[llm]
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
timeout_secs = 60
temperature = 0.2
max_tokens = 4096

[rate_limit]
max_requests = 15
window_ms = 60000

[retry]
max_attempts = 3
backoff_base_ms = 800
corrective_attempts = 2
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let config = ConfigLoader::load_layers(None, None).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");

        fs::write(&global, "[llm]\nmodel = \"global-model\"\ntimeout_secs = 30\n").unwrap();
        fs::write(&project, "[llm]\nmodel = \"project-model\"\n").unwrap();

        let config = ConfigLoader::load_layers(Some(&global), Some(&project)).unwrap();
        assert_eq!(config.llm.model, "project-model");
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_default_file_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default(temp_dir.path(), false).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests, 15);
        assert_eq!(config.retry.backoff_base_ms, 800);
    }

    #[test]
    fn test_write_default_respects_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_default(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[rate_limit]"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[rate_limit]\nmax_requests = 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, SrsError::Config(_)));
    }
}
