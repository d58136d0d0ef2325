//! # Relay
//!
//! A small, pluggable chat-bot runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  Inbound  ┌────────────┐  first match  ┌──────────────────┐
//! │  Adapter    │─────────▶│   Router   │─────────────▶│ Plugin handler   │──▶ Store
//! │ (console)   │◀─────────└────────────┘               └──────────────────┘
//! └─────────────┘      Request::respond        │ no match
//!                                              └──▶ I don't know command "…".
//! ```
//!
//! - **Adapters** connect an external medium (a terminal, a mailbox) and turn
//!   each incoming text into a request.
//! - **Plugins** declare regular-expression patterns with `#[route]`. The
//!   first pattern that matches the start of a message handles it.
//! - **Store** is a namespaced, persistent key-value store; each plugin sees
//!   only its own keys.
//! - **Workers** run a plugin's periodic job in the background.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::prelude::*;
//! use relay_adapter_console::CONSOLE_ADAPTER;
//!
//! pub struct Cats;
//!
//! #[routes]
//! impl Cats {
//!     /// Shows a cat.
//!     #[route("show me a cat")]
//!     async fn show(self: Arc<Self>, request: BoxedRequest, _: Captures) -> anyhow::Result<()> {
//!         request.respond("the Cat").await?;
//!         Ok(())
//!     }
//! }
//!
//! impl Plugin for Cats {}
//!
//! static CATS: PluginDescriptor = PluginDescriptor {
//!     name: "cats",
//!     create: |_ctx| Ok(Arc::new(Cats)),
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     RelayRuntime::builder()
//!         .register_adapter(CONSOLE_ADAPTER)
//!         .plugin(CATS)
//!         .build()
//!         .await?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! `#[routes]` expands to paths under `::relay_framework`; crates using it
//! depend on `relay-framework` directly.
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `relay.toml` configuration files
//! - `json-log`: JSON log lines

pub use relay_core as core;
pub use relay_framework as framework;
pub use relay_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use relay::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime
    pub use relay_runtime::{Catalog, RelayConfig, RelayRuntime, RuntimeError};

    // Plugins
    pub use relay_framework::{
        Captures, HandlerOutput, Plugin, PluginContext, PluginDescriptor, Routable, Worker,
        WorkerSlot, routes,
    };

    // Adapters and requests
    pub use relay_core::{
        Adapter, AdapterContext, AdapterDescriptor, AdapterError, AdapterResult, BoxedRequest,
        Dispatcher, Inbound, Request, Store,
    };
}
