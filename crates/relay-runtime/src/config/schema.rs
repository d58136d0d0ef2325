//! Configuration schema definitions.
//!
//! ```toml
//! adapters = ["console"]
//! plugins = ["reminder"]
//!
//! [storage]
//! backend = "file"
//! path = "relay.storage.json"
//!
//! [worker]
//! tick_ms = 1000
//!
//! [logging]
//! level = "warn"
//! output = "file"
//! file_path = "relay.log"
//!
//! [settings.console]
//! prompt = "> "
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Adapters to start, in order.
    #[serde(default = "default_adapters")]
    pub adapters: Vec<String>,

    /// Plugins to load, in order. `help` is always loaded last.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Persistent key-value storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Background worker scheduling.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-component settings, keyed by adapter or plugin name.
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            adapters: default_adapters(),
            plugins: Vec::new(),
            storage: StorageConfig::default(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
            settings: BTreeMap::new(),
        }
    }
}

impl RelayConfig {
    /// Returns the settings of `component`, or `null` if there are none.
    pub fn settings_for(&self, component: &str) -> serde_json::Value {
        self.settings
            .get(component)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }
}

fn default_adapters() -> Vec<String> {
    vec!["console".to_string()]
}

// =============================================================================
// Storage
// =============================================================================

/// Where the store keeps its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A JSON file at [`StorageConfig::path`].
    #[default]
    File,
    /// Process memory only. Nothing survives a restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path of the JSON file used by the `file` backend.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("relay.storage.json")
}

// =============================================================================
// Worker
// =============================================================================

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// How often a worker loop checks its schedule, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

fn default_tick_ms() -> u64 {
    1000
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// The file at [`LoggingConfig::file_path`]. Keeps log lines out of the
    /// console conversation.
    #[default]
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for the `file` output.
    #[serde(default = "default_log_file")]
    pub file_path: Option<PathBuf>,

    /// Per-target level overrides, e.g. `relay_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: default_log_file(),
            filters: BTreeMap::new(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
        }
    }
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("relay.log"))
}
