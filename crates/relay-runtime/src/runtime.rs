//! Bot composition and lifecycle.
//!
//! [`RuntimeBuilder::build`] turns a configuration into a running bot:
//!
//! ```text
//! config ──▶ logging ──▶ store ──▶ plugins (+ help) ──▶ bindings ──▶ Router
//!                                                                  │
//!                                   adapters ◀── AdapterContext ◀──┘
//!                                      │
//!                                      ▼
//!                                    start
//! ```
//!
//! Every binding is collected before the first adapter starts, so no message
//! is ever dispatched against a partial binding list.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use relay_runtime::RelayRuntime;
//!
//! let runtime = RelayRuntime::builder()
//!     .register_adapter(CONSOLE_ADAPTER)
//!     .register_plugin(REMINDER_PLUGIN)
//!     .build()
//!     .await?;
//!
//! // Until an adapter sends the exit signal, Ctrl+C or SIGTERM.
//! runtime.run().await?;
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use relay_core::{Adapter, AdapterContext, AdapterDescriptor, BoxedAdapter, Dispatcher, Store};
use relay_framework::{
    HELP_PLUGIN, HelpPlugin, Plugin, PluginContext, PluginDescriptor, Router, collect,
};
use tokio::signal;
use tracing::{debug, info, warn};

use crate::config::{
    ConfigError, ConfigLoader, RelayConfig, StorageBackend, validate_config,
};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::registry::Catalog;

/// A composed, started bot.
///
/// Holds the loaded adapters and plugins in configuration order, the shared
/// [`Router`] and the root [`Store`].
pub struct RelayRuntime {
    config: RelayConfig,
    store: Store,
    router: Arc<Router>,
    adapters: Vec<(&'static str, BoxedAdapter)>,
    plugins: Vec<(&'static str, Arc<dyn Plugin>)>,
}

impl RelayRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Returns the root (unprefixed) store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Returns the router as the dispatcher adapters deliver to.
    pub fn dispatcher(&self) -> Arc<dyn Dispatcher> {
        self.router.clone()
    }

    /// Looks up a started adapter by name and concrete type.
    pub fn adapter<A: Adapter>(&self, name: &str) -> Option<Arc<A>> {
        self.adapters
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, adapter)| Arc::clone(adapter).as_any().downcast::<A>().ok())
    }

    /// Looks up a loaded plugin by name and concrete type.
    pub fn plugin<P: Plugin>(&self, name: &str) -> Option<Arc<P>> {
        self.plugins
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, plugin)| Arc::clone(plugin).as_any().downcast::<P>().ok())
    }

    /// Adapter names in start order.
    pub fn adapter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.iter().map(|(name, _)| *name)
    }

    /// Plugin names in load order. `help` is always last.
    pub fn plugin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|(name, _)| *name)
    }

    /// Returns `true` once an adapter has sent the exit signal.
    pub fn is_exiting(&self) -> bool {
        self.router.is_exiting()
    }

    /// Waits for the exit signal.
    pub async fn wait_for_exit(&self) {
        self.router.exit_token().cancelled().await;
    }

    /// Runs until the exit signal, Ctrl+C or SIGTERM, then closes the bot.
    pub async fn run(self) -> RuntimeResult<()> {
        info!(
            adapters = ?self.adapter_names().collect::<Vec<_>>(),
            plugins = ?self.plugin_names().collect::<Vec<_>>(),
            "Relay is running"
        );

        tokio::select! {
            _ = self.wait_for_exit() => info!("Exit signal received, shutting down"),
            _ = wait_for_shutdown() => {}
        }

        self.close()
    }

    /// Flushes and releases the store.
    ///
    /// Adapter tasks and plugin workers are detached and not waited for.
    pub fn close(self) -> RuntimeResult<()> {
        self.store.close()?;
        info!("Relay stopped");
        Ok(())
    }
}

impl std::fmt::Debug for RelayRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRuntime")
            .field("adapters", &self.adapter_names().collect::<Vec<_>>())
            .field("plugins", &self.plugin_names().collect::<Vec<_>>())
            .field("store", &self.store)
            .field("exiting", &self.is_exiting())
            .finish()
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                Ok(()) = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`RelayRuntime`].
///
/// Adapters and plugins are chosen in one of two ways:
///
/// - By name: `register_*` puts descriptors in the [`Catalog`], and the
///   `adapters`/`plugins` lists of the configuration select from it.
/// - Explicitly: [`adapter`](Self::adapter) and [`plugin`](Self::plugin)
///   build exactly the given descriptors, ignoring the configured names.
pub struct RuntimeBuilder {
    loader: ConfigLoader,
    config: Option<RelayConfig>,
    catalog: Catalog,
    adapters: Option<Vec<AdapterDescriptor>>,
    plugins: Option<Vec<PluginDescriptor>>,
    store: Option<Store>,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
            config: None,
            catalog: Catalog::new(),
            adapters: None,
            plugins: None,
            store: None,
            init_logging: true,
        }
    }

    /// Loads configuration from exactly this file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Adds a directory to search for `relay.toml`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Ignores `RELAY_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Merges programmatic values below files and environment.
    pub fn merge(mut self, config: RelayConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    /// Uses `config` as is. No file or environment source is read.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the catalog.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn register_adapter(mut self, descriptor: AdapterDescriptor) -> Self {
        self.catalog.register_adapter(descriptor);
        self
    }

    pub fn register_plugin(mut self, descriptor: PluginDescriptor) -> Self {
        self.catalog.register_plugin(descriptor);
        self
    }

    /// Builds this adapter. Once called, configured adapter names are ignored.
    pub fn adapter(mut self, descriptor: AdapterDescriptor) -> Self {
        self.adapters.get_or_insert_with(Vec::new).push(descriptor);
        self
    }

    /// Builds this plugin. Once called, configured plugin names are ignored.
    pub fn plugin(mut self, descriptor: PluginDescriptor) -> Self {
        self.plugins.get_or_insert_with(Vec::new).push(descriptor);
        self
    }

    /// Uses `store` instead of the configured storage.
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Whether to install the global log subscriber (default `true`).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Composes and starts the bot.
    ///
    /// Fails on unknown names, a failing factory, an invalid pattern, an
    /// unopenable store or an adapter that fails to start.
    pub async fn build(self) -> RuntimeResult<RelayRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let adapters = match self.adapters {
            Some(explicit) => explicit,
            None => resolve(&config.adapters, |name| self.catalog.adapter(name))
                .map_err(RuntimeError::UnknownAdapter)?,
        };
        let mut plugins = match self.plugins {
            Some(explicit) => explicit,
            None => resolve(&config.plugins, |name| self.catalog.plugin(name))
                .map_err(RuntimeError::UnknownPlugin)?,
        };
        check_unique("adapter", adapters.iter().map(|d| d.name))?;
        check_unique("plugin", plugins.iter().map(|d| d.name))?;
        if plugins.iter().any(|d| d.name == HELP_PLUGIN.name) {
            return Err(ConfigError::validation("the help plugin is always loaded").into());
        }
        plugins.push(HELP_PLUGIN);

        let store = match self.store {
            Some(store) => store,
            None => match config.storage.backend {
                StorageBackend::Memory => Store::in_memory(),
                StorageBackend::File => {
                    debug!(path = %config.storage.path.display(), "Opening store");
                    Store::open(&config.storage.path)?
                }
            },
        };

        let loaded = load_plugins(&config, &store, &plugins)?;

        let mut bindings = Vec::new();
        for (name, plugin) in &loaded {
            bindings.extend(collect(name, Arc::clone(plugin))?);
        }
        let router = Arc::new(Router::new(bindings));
        debug!(bindings = router.bindings().len(), "Router ready");

        if let Some(help) = loaded
            .iter()
            .find(|(name, _)| *name == HELP_PLUGIN.name)
            .and_then(|(_, plugin)| Arc::clone(plugin).as_any().downcast::<HelpPlugin>().ok())
        {
            help.publish(router.bindings());
        }

        let dispatcher: Arc<dyn Dispatcher> = router.clone();
        let mut created = Vec::with_capacity(adapters.len());
        for descriptor in &adapters {
            let ctx = AdapterContext::new(descriptor.name, Arc::clone(&dispatcher))
                .with_settings(config.settings_for(descriptor.name));
            let adapter = descriptor
                .instantiate(ctx)
                .map_err(|source| RuntimeError::AdapterInit {
                    adapter: descriptor.name.to_string(),
                    source,
                })?;
            created.push((descriptor.name, adapter));
        }

        for (name, adapter) in &created {
            Arc::clone(adapter)
                .start()
                .await
                .map_err(|source| RuntimeError::AdapterStart {
                    adapter: name.to_string(),
                    source,
                })?;
            info!(adapter = *name, "Adapter started");
        }

        Ok(RelayRuntime {
            config,
            store,
            router,
            adapters: created,
            plugins: loaded,
        })
    }
}

/// Maps names to descriptors, failing with the first unknown name.
fn resolve<D>(names: &[String], lookup: impl Fn(&str) -> Option<D>) -> Result<Vec<D>, String> {
    names
        .iter()
        .map(|name| lookup(name).ok_or_else(|| name.clone()))
        .collect()
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> RuntimeResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::duplicate(kind, name).into());
        }
    }
    Ok(())
}

/// Instantiates plugins in order, each with its own store namespace.
fn load_plugins(
    config: &RelayConfig,
    store: &Store,
    plugins: &[PluginDescriptor],
) -> RuntimeResult<Vec<(&'static str, Arc<dyn Plugin>)>> {
    let tick = config.worker.tick();
    let mut loaded = Vec::with_capacity(plugins.len());

    for descriptor in plugins {
        let ctx = PluginContext::new(
            descriptor.name,
            store.with_prefix(&format!("{}:", descriptor.name)),
        )
        .with_settings(config.settings_for(descriptor.name))
        .with_worker_tick(tick);

        let plugin = descriptor
            .instantiate(ctx)
            .map_err(|source| RuntimeError::PluginInit {
                plugin: descriptor.name.to_string(),
                source,
            })?;
        info!(plugin = descriptor.name, "Plugin loaded");
        loaded.push((descriptor.name, plugin));
    }

    Ok(loaded)
}

// =============================================================================
// Tests
// =============================================================================
