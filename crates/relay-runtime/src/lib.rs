//! Relay Runtime - composition layer of the Relay bot runtime.
//!
//! This crate provides:
//! - Configuration loading and validation (`relay.toml`, `RELAY_*`)
//! - Logging setup
//! - The [`Catalog`] of adapter and plugin descriptors
//! - [`RelayRuntime`], which builds the bot from configuration and runs it
//!   until exit
//!
//! ```rust,ignore
//! use relay_runtime::RelayRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = RelayRuntime::builder()
//!         .register_adapter(CONSOLE_ADAPTER)
//!         .register_plugin(REMINDER_PLUGIN)
//!         .build()
//!         .await?;
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, RelayConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::Catalog;
pub use runtime::{RelayRuntime, RuntimeBuilder};

pub use tracing;

/// Logging macros for plugins and adapters.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
