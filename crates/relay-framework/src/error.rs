//! Error types for the Relay framework.

use thiserror::Error;

/// Errors raised while turning plugin routes into bindings.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A route pattern is not a valid regular expression.
    #[error("plugin '{plugin}' declares an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Plugin that declared the route.
        plugin: String,
        /// The offending pattern.
        pattern: String,
        /// The regex compiler's complaint.
        #[source]
        source: regex::Error,
    },
}

/// Result type for route collection.
pub type RouteResult<T> = Result<T, RouteError>;
