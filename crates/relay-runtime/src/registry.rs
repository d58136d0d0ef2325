//! Name → descriptor lookup for adapters and plugins.
//!
//! Configuration names components by string. A [`Catalog`] maps those names
//! to the static descriptors a binary was compiled with:
//!
//! ```rust,ignore
//! let catalog = Catalog::new()
//!     .with_adapter(CONSOLE_ADAPTER)
//!     .with_plugin(REMINDER_PLUGIN);
//!
//! let reminder = catalog.plugin("reminder");
//! ```

use std::collections::BTreeMap;

use relay_core::AdapterDescriptor;
use relay_framework::PluginDescriptor;
use tracing::warn;

/// Registry of known adapter and plugin descriptors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    adapters: BTreeMap<&'static str, AdapterDescriptor>,
    plugins: BTreeMap<&'static str, PluginDescriptor>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter. A later descriptor with the same name wins.
    pub fn register_adapter(&mut self, descriptor: AdapterDescriptor) {
        if self.adapters.insert(descriptor.name, descriptor).is_some() {
            warn!(adapter = descriptor.name, "Adapter registered twice, keeping the last");
        }
    }

    /// Registers a plugin. A later descriptor with the same name wins.
    pub fn register_plugin(&mut self, descriptor: PluginDescriptor) {
        if self.plugins.insert(descriptor.name, descriptor).is_some() {
            warn!(plugin = descriptor.name, "Plugin registered twice, keeping the last");
        }
    }

    pub fn with_adapter(mut self, descriptor: AdapterDescriptor) -> Self {
        self.register_adapter(descriptor);
        self
    }

    pub fn with_plugin(mut self, descriptor: PluginDescriptor) -> Self {
        self.register_plugin(descriptor);
        self
    }

    pub fn adapter(&self, name: &str) -> Option<AdapterDescriptor> {
        self.adapters.get(name).copied()
    }

    pub fn plugin(&self, name: &str) -> Option<PluginDescriptor> {
        self.plugins.get(name).copied()
    }

    /// Registered adapter names, sorted.
    pub fn adapter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.keys().copied()
    }

    /// Registered plugin names, sorted.
    pub fn plugin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{AdapterContext, AdapterError};
    use relay_framework::HELP_PLUGIN;

    static NULL_ADAPTER: AdapterDescriptor = AdapterDescriptor {
        name: "null",
        create: |_ctx: AdapterContext| Err(AdapterError::Internal("not buildable".into())),
    };

    #[test]
    fn test_lookup_by_name() {
        let catalog = Catalog::new()
            .with_adapter(NULL_ADAPTER)
            .with_plugin(HELP_PLUGIN);

        assert_eq!(catalog.adapter("null").map(|d| d.name), Some("null"));
        assert_eq!(catalog.plugin("help").map(|d| d.name), Some("help"));
        assert!(catalog.adapter("help").is_none());
        assert!(catalog.plugin("todo").is_none());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut catalog = Catalog::new();
        catalog.register_plugin(PluginDescriptor {
            name: "zeta",
            ..HELP_PLUGIN
        });
        catalog.register_plugin(HELP_PLUGIN);
        catalog.register_plugin(HELP_PLUGIN);

        assert_eq!(catalog.plugin_names().collect::<Vec<_>>(), ["help", "zeta"]);
        assert_eq!(catalog.adapter_names().count(), 0);
    }
}
