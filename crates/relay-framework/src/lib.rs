//! # Relay Framework
//!
//! Routing and plugin machinery for the Relay bot runtime.
//!
//! This layer provides:
//! - Route tables and handler erasure ([`routing`])
//! - The capability registry that turns a plugin into bindings ([`capability`])
//! - The dispatch core, [`Router`], which matches messages against bindings
//! - The [`Plugin`] trait, its descriptor and the built-in help plugin
//! - The periodic [`Worker`] lifecycle for plugins with background jobs
//!
//! ```text
//!  Plugin ──routes()──▶ Routes ──collect()──▶ [Binding] ──▶ Router
//!                                                             │
//!  Adapter ───────────── Inbound ────────────────────────────▶┘
//! ```

extern crate self as relay_framework;

pub mod capability;
pub mod dispatcher;
pub mod error;
pub mod plugin;
pub mod routing;
pub mod worker;

pub use capability::{Binding, collect};
pub use dispatcher::{Router, unknown_command};
pub use error::{RouteError, RouteResult};
pub use plugin::builtin::{HELP_PLUGIN, HelpPlugin};
pub use plugin::{Plugin, PluginContext, PluginDescriptor, Routable};
pub use routing::{BoxedHandler, Captures, HandlerOutcome, HandlerOutput, Route, Routes, RoutesBuilder};
pub use worker::{DEFAULT_TICK, Worker, WorkerSlot};

pub use relay_macros::routes;
