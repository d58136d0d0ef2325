//! Runtime error types.

use relay_core::{AdapterError, BoxError, StoreError};
use relay_framework::RouteError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while composing or running the bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No adapter with this name is registered.
    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    /// No plugin with this name is registered.
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    /// A plugin factory failed.
    #[error("Failed to create plugin '{plugin}': {source}")]
    PluginInit {
        plugin: String,
        #[source]
        source: BoxError,
    },

    /// An adapter factory failed.
    #[error("Failed to create adapter '{adapter}': {source}")]
    AdapterInit {
        adapter: String,
        #[source]
        source: AdapterError,
    },

    /// An adapter failed to start.
    #[error("Failed to start adapter '{adapter}': {source}")]
    AdapterStart {
        adapter: String,
        #[source]
        source: AdapterError,
    },

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// A plugin declared an invalid pattern.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
