//! Plugin system for the Relay framework.
//!
//! # Architecture
//!
//! A plugin is any `Send + Sync + 'static` type that implements [`Plugin`].
//! It owns:
//!
//! - A [`Store`] view namespaced by its name (`"<name>:"`).
//! - Zero or more routes, exposed through [`Routable`].
//! - Optionally a [`WorkerSlot`](crate::WorkerSlot) for a periodic job.
//!
//! A [`PluginDescriptor`] is the static, `Copy` handle to a plugin: a name and
//! a factory. The runtime calls [`PluginDescriptor::instantiate`] exactly once
//! per configured name.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use relay::prelude::*;
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
//! pub static CATS: PluginDescriptor = PluginDescriptor {
//!     name: "cats",
//!     create: |_ctx| Ok(Arc::new(Cats)),
//! };
//! ```
//!
//! # Settings
//!
//! The plugin's section of `settings` in `relay.toml` arrives as raw JSON in
//! [`PluginContext::settings`]:
//!
//! ```toml
//! [settings.reminder]
//! interval_secs = 30
//! ```

pub mod builtin;
pub mod descriptor;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{AsAny, Store};
use serde::de::DeserializeOwned;

use crate::routing::Routes;
use crate::worker::{DEFAULT_TICK, WorkerSlot};

pub use descriptor::{PluginDescriptor, PluginFactory};

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Exposes a plugin's route table.
///
/// Usually generated by [`#[routes]`](relay_macros::routes). Plugins without
/// routes keep the default empty table.
pub trait Routable {
    /// Returns the routes of this instance, in declaration order.
    fn routes(self: Arc<Self>) -> Routes {
        Routes::default()
    }
}

/// A unit of bot behaviour.
///
/// Plugins are created once at startup and live for the whole process.
pub trait Plugin: Routable + AsAny {}

// ─── PluginContext ───────────────────────────────────────────────────────────

/// Everything a plugin receives at construction time.
#[derive(Clone)]
pub struct PluginContext {
    /// The name the plugin was resolved under.
    pub name: String,
    /// The plugin's private store view.
    pub store: Store,
    /// The plugin's raw settings section (`null` when absent).
    pub settings: serde_json::Value,
    /// Tick used by workers created through [`worker_slot`](Self::worker_slot).
    pub worker_tick: Duration,
}

impl PluginContext {
    /// Creates a context with no settings and the default worker tick.
    pub fn new(name: impl Into<String>, store: Store) -> Self {
        Self {
            name: name.into(),
            store,
            settings: serde_json::Value::Null,
            worker_tick: DEFAULT_TICK,
        }
    }

    /// Attaches a raw settings section.
    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the worker tick.
    pub fn with_worker_tick(mut self, tick: Duration) -> Self {
        self.worker_tick = tick;
        self
    }

    /// Deserializes the settings section into `T`.
    ///
    /// An absent section yields `T::default()`.
    pub fn settings<T>(&self) -> serde_json::Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.settings.is_null() {
            return Ok(T::default());
        }
        T::deserialize(&self.settings)
    }

    /// Creates an idle worker slot using the configured tick.
    pub fn worker_slot(&self) -> WorkerSlot {
        WorkerSlot::with_tick(self.worker_tick)
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("worker_tick", &self.worker_tick)
            .finish()
    }
}
