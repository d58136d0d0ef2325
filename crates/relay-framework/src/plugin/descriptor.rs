//! Plugin descriptor, the static `Copy` handle to a plugin.

use std::sync::Arc;

use relay_core::BoxError;

use super::{Plugin, PluginContext};

/// Factory signature stored in a [`PluginDescriptor`].
pub type PluginFactory = fn(PluginContext) -> Result<Arc<dyn Plugin>, BoxError>;

/// A static, `Copy` descriptor that names a plugin and knows how to build it.
///
/// ```rust,ignore
/// pub static REMINDER: PluginDescriptor = PluginDescriptor {
///     name: "reminder",
///     create: Reminder::create,
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Name used in configuration and as the store namespace.
    pub name: &'static str,

    /// Factory function that creates the live plugin.
    pub create: PluginFactory,
}

impl PluginDescriptor {
    /// Creates the live plugin from the factory function.
    ///
    /// Prefer letting the runtime builder do this; it also scopes the store.
    #[inline]
    pub fn instantiate(&self, ctx: PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
        (self.create)(ctx)
    }
}
