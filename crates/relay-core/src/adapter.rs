//! Adapter trait and the dispatcher callback.
//!
//! Adapters turn events from an external medium (terminal, socket, mailbox)
//! into [`Inbound`] values and hand them to the [`Dispatcher`]. Answers flow
//! back out through the adapter's own [`Request`](crate::Request) type.
//!
//! # Architecture
//!
//! ```text
//! medium ──▶ Adapter ──Inbound──▶ Dispatcher
//!   ▲                                 │
//!   └──────── Request::respond ◀──────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! pub static LOOPBACK: AdapterDescriptor = AdapterDescriptor {
//!     name: "loopback",
//!     create: |ctx| Ok(Arc::new(Loopback { dispatcher: ctx.dispatcher })),
//! };
//!
//! #[async_trait]
//! impl Adapter for Loopback {
//!     fn name(&self) -> &str {
//!         "loopback"
//!     }
//!
//!     async fn start(self: Arc<Self>) -> AdapterResult<()> {
//!         tokio::spawn(async move { /* poll the medium, call dispatch */ });
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::downcast::AsAny;
use crate::error::{AdapterResult, DispatchResult};
use crate::request::Inbound;

// =============================================================================
// Dispatcher
// =============================================================================

/// The entry point adapters deliver inbound messages to.
///
/// May be called concurrently from several adapters. Calls from one adapter
/// should be awaited in order to keep that adapter's messages ordered.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Routes one inbound message.
    ///
    /// Returns an error only for handler failures and contract violations;
    /// an unmatched message is answered and reported as `Ok`.
    async fn dispatch(&self, inbound: Inbound) -> DispatchResult<()>;
}

// =============================================================================
// Adapter Trait
// =============================================================================

/// An external medium.
///
/// Adapters are created once at startup and are never joined on shutdown;
/// any background task an adapter spawns must not block process exit.
#[async_trait]
pub trait Adapter: AsAny {
    /// Returns the adapter name (the key used in configuration).
    fn name(&self) -> &str;

    /// Begins delivering messages.
    ///
    /// Called once by the runtime. Adapters that poll their medium spawn a
    /// task here; adapters driven from outside keep the default.
    async fn start(self: Arc<Self>) -> AdapterResult<()> {
        Ok(())
    }
}

/// A shared adapter trait object.
pub type BoxedAdapter = Arc<dyn Adapter>;

// =============================================================================
// Construction
// =============================================================================

/// Everything an adapter receives at construction time.
#[derive(Clone)]
pub struct AdapterContext {
    /// The name the adapter was resolved under.
    pub name: String,
    /// The callback into the dispatch core.
    pub dispatcher: Arc<dyn Dispatcher>,
    /// The adapter's raw settings section (`null` when absent).
    pub settings: serde_json::Value,
}

impl AdapterContext {
    /// Creates a context with no settings.
    pub fn new(name: impl Into<String>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            name: name.into(),
            dispatcher,
            settings: serde_json::Value::Null,
        }
    }

    /// Attaches a raw settings section.
    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = settings;
        self
    }

    /// Deserializes the settings section into `T`.
    ///
    /// An absent section yields `T::default()`.
    pub fn settings<T>(&self) -> AdapterResult<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.settings.is_null() {
            return Ok(T::default());
        }
        Ok(T::deserialize(&self.settings)?)
    }
}

impl fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterContext")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Factory signature stored in an [`AdapterDescriptor`].
pub type AdapterFactory = fn(AdapterContext) -> AdapterResult<BoxedAdapter>;

/// A static, `Copy` handle that names an adapter and knows how to build it.
#[derive(Debug, Clone, Copy)]
pub struct AdapterDescriptor {
    /// Name used in configuration (`adapters = ["console"]`).
    pub name: &'static str,
    /// Factory function that creates the live adapter.
    pub create: AdapterFactory,
}

impl AdapterDescriptor {
    /// Creates the live adapter from the factory function.
    #[inline]
    pub fn instantiate(&self, ctx: AdapterContext) -> AdapterResult<BoxedAdapter> {
        (self.create)(ctx)
    }
}
