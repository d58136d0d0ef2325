//! Configuration for the Relay runtime.
//!
//! A [`RelayConfig`] names the adapters and plugins to load and carries the
//! storage, worker and logging settings plus free-form per-component
//! settings. It is loaded by [`ConfigLoader`] from defaults, `relay.toml`
//! and `RELAY_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, RelayConfig, SpanEventConfig, StorageBackend,
    StorageConfig, WorkerConfig,
};
pub use validation::validate_config;
