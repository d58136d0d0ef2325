//! Capability registry: plugin instance in, bindings out.
//!
//! Runs once per plugin at startup. Every declared pattern is compiled here,
//! so a bad pattern fails the whole startup instead of a later dispatch.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use relay_core::BoxedRequest;
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::plugin::Plugin;
use crate::routing::{BoxedHandler, Captures, HandlerOutcome};

/// A compiled `(pattern, handler)` pair owned by the dispatch core.
///
/// Immutable once created.
#[derive(Clone)]
pub struct Binding {
    plugin: Arc<str>,
    pattern: String,
    doc: Option<String>,
    regex: Regex,
    handler: BoxedHandler,
}

impl Binding {
    /// Compiles `pattern` so that it only matches at the start of a message.
    pub fn new(
        plugin: &str,
        pattern: impl Into<String>,
        doc: Option<String>,
        handler: BoxedHandler,
    ) -> RouteResult<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            RouteError::InvalidPattern {
                plugin: plugin.to_owned(),
                pattern: pattern.clone(),
                source,
            }
        })?;
        Ok(Self {
            plugin: Arc::from(plugin),
            pattern,
            doc,
            regex,
            handler,
        })
    }

    /// Name of the plugin that declared this binding.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The pattern as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The handler's one-line description.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Matches `message` and returns the named groups on success.
    ///
    /// The match is anchored at the start; trailing text is allowed.
    pub fn captures(&self, message: &str) -> Option<Captures> {
        let caps = self.regex.captures(message)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.to_owned(), m.as_str().to_owned()))
                })
                .collect(),
        )
    }

    /// Runs the handler.
    pub fn invoke(
        &self,
        request: BoxedRequest,
        captures: Captures,
    ) -> BoxFuture<'static, HandlerOutcome> {
        (self.handler)(request, captures)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("plugin", &self.plugin)
            .field("pattern", &self.pattern)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

/// Extracts the bindings of one plugin, in declaration order.
pub fn collect(name: &str, plugin: Arc<dyn Plugin>) -> RouteResult<Vec<Binding>> {
    let bindings = plugin
        .routes()
        .into_iter()
        .map(|route| Binding::new(name, route.pattern, route.doc, route.handler))
        .collect::<RouteResult<Vec<_>>>()?;

    debug!(plugin = %name, routes = bindings.len(), "Collected plugin routes");
    Ok(bindings)
}
