//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `relay.toml` configuration files
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`ConfigLoader::merge`])
//! 3. Main config file (`relay.toml`)
//! 4. Profile-specific config file (`relay.{profile}.toml`)
//! 5. Environment variables (`RELAY_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `RELAY_` prefix with `__` as the nesting
//! separator:
//!
//! - `RELAY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `RELAY_WORKER__TICK_MS=250` → `worker.tick_ms = 250`
//! - `RELAY_PLUGINS=[reminder]` → `plugins = ["reminder"]`
//! - `RELAY_SETTINGS__CONSOLE__PROMPT=">"` → `settings.console.prompt = ">"`
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/relay.toml")
//!     .without_env()
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::RelayConfig;

const ENV_PREFIX: &str = "RELAY_";
const PROFILE_VAR: &str = "RELAY_PROFILE";
const BASE_NAME: &str = "relay";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name. `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `RELAY_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for `relay.toml`.
    ///
    /// Without any search path the current directory and the user config
    /// directory (`~/.config/relay` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. A missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `RELAY_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values programmatically, above the defaults and
    /// below any file or environment source.
    pub fn merge(mut self, config: RelayConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<RelayConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: RelayConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(
            profile = %profile,
            adapters = ?config.adapters,
            plugins = ?config.plugins,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RelayConfig::default()))
            .merge(std::mem::take(&mut self.overrides));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_file(figment, &path)?;
        } else {
            figment = self.search_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(BASE_NAME));
        }
        paths
    }

    /// Merges `relay.toml` and `relay.{profile}.toml` from the first search
    /// path that has either.
    #[cfg(feature = "toml-config")]
    fn search_files(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            let base = dir.join(format!("{BASE_NAME}.toml"));
            let profiled = dir.join(format!("{BASE_NAME}.{}.toml", self.profile));
            if !base.exists() && !profiled.exists() {
                continue;
            }
            if base.exists() {
                info!(path = %base.display(), "Loading configuration file");
                figment = figment.merge(Toml::file(&base));
            }
            if profiled.exists() {
                debug!(path = %profiled.display(), "Loading profile-specific config");
                figment = figment.merge(Toml::file(&profiled));
            }
            return figment;
        }
        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn search_files(&self, figment: Figment) -> Figment {
        figment
    }
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<RelayConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus environment variables.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<RelayConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, StorageBackend};
    use std::fs;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.adapters, ["console"]);
        assert!(config.plugins.is_empty());
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_searched_file_and_profile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("relay.toml"),
            "plugins = [\"reminder\"]\n[worker]\ntick_ms = 500\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("relay.production.toml"),
            "[worker]\ntick_ms = 2000\n",
        )
        .unwrap();

        let dev = ConfigLoader::new()
            .profile("dev")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(dev.plugins, ["reminder"]);
        assert_eq!(dev.worker.tick_ms, 500);

        let prod = ConfigLoader::new()
            .profile("prod")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(prod.plugins, ["reminder"]);
        assert_eq!(prod.worker.tick_ms, 2000);
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        fs::write(
            &path,
            "adapters = []\n[storage]\nbackend = \"memory\"\n[settings.reminder]\nlimit = 3\n",
        )
        .unwrap();

        let config = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert!(config.adapters.is_empty());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.settings_for("reminder")["limit"], 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::new()
            .file("/nonexistent/relay.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.ini");
        fs::write(&path, "").unwrap();

        let result = ConfigLoader::new().file(&path).without_env().load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(RelayConfig {
                plugins: vec!["todo".into()],
                ..Default::default()
            })
            .load()
            .unwrap();
        assert_eq!(config.plugins, ["todo"]);
    }

    #[test]
    fn test_file_overrides_merge() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("relay.toml"), "plugins = [\"reminder\"]\n").unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(RelayConfig {
                adapters: Vec::new(),
                plugins: vec!["todo".into()],
                ..Default::default()
            })
            .load()
            .unwrap();
        assert_eq!(config.plugins, ["reminder"]);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
