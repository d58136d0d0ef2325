//! Unified error types for the Relay core.
//!
//! Routing-level errors that only the framework can produce (bad patterns)
//! live in `relay-framework`; everything an adapter may observe lives here.

use thiserror::Error;

/// A type-erased, thread-safe error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter could not be started.
    #[error("adapter '{adapter}' failed to start: {reason}")]
    StartFailed {
        /// Name of the adapter.
        adapter: String,
        /// Reason for failure.
        reason: String,
    },

    /// A response could not be delivered back to the external medium.
    #[error("failed to send response: {0}")]
    SendFailed(String),

    /// The adapter settings could not be deserialized.
    #[error("invalid adapter settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal adapter error.
    #[error("adapter error: {0}")]
    Internal(String),
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors surfaced to the caller of [`Dispatcher::dispatch`].
///
/// An unmatched message is **not** an error: the dispatcher answers it with
/// the unknown-command reply and returns `Ok`.
///
/// [`Dispatcher::dispatch`]: crate::Dispatcher::dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler returned a value instead of answering through
    /// [`Request::respond`](crate::Request::respond).
    #[error(
        "handler for pattern '{pattern}' in plugin '{plugin}' returned {returned:?}; \
         handlers must answer with request.respond(..)"
    )]
    InvalidHandlerContract {
        /// Plugin that registered the handler.
        plugin: String,
        /// Pattern that matched.
        pattern: String,
        /// The value the handler returned.
        returned: String,
    },

    /// A handler failed.
    #[error("handler for pattern '{pattern}' in plugin '{plugin}' failed: {source}")]
    Handler {
        /// Plugin that registered the handler.
        plugin: String,
        /// Pattern that matched.
        pattern: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// The dispatcher's own reply could not be delivered.
    #[error(transparent)]
    Respond(#[from] AdapterError),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the namespaced store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not present. A key holding `null` is present.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
