//! Route tables and handler erasure.
//!
//! A plugin exposes its routes as a [`Routes`] table: an ordered list of
//! `(pattern, description, handler)` entries. Tables are normally generated
//! by the [`#[routes]`](relay_macros::routes) attribute, but can be written by
//! hand through [`Routes::builder`]:
//!
//! ```rust,ignore
//! impl Routable for Cats {
//!     fn routes(self: Arc<Self>) -> Routes {
//!         Routes::builder(self)
//!             .route_with_doc("show me a cat", "Shows a cat.", Cats::show)
//!             .route("find (?P<this>.*)", Cats::find)
//!             .build()
//!     }
//! }
//! ```
//!
//! # Handler contract
//!
//! Handlers answer by calling [`Request::respond`](relay_core::Request::respond)
//! and return nothing. The return type is still checked at runtime through
//! [`HandlerOutput`]:
//!
//! | Return type | Outcome |
//! |-------------|---------|
//! | `()` | [`HandlerOutcome::Done`] |
//! | `String`, `&'static str` | [`HandlerOutcome::Returned`] (a contract violation) |
//! | `Option<T>` | `None` is done, `Some(t)` is `t`'s outcome |
//! | `Result<T, E>` | `Ok(t)` is `t`'s outcome, `Err(e)` is [`HandlerOutcome::Failed`] |

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use relay_core::BoxedRequest;

// ============================================================================
// Captures
// ============================================================================

/// Named groups captured by a route pattern.
///
/// Groups that did not participate in the match are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    groups: HashMap<String, String>,
}

impl Captures {
    /// Returns the text captured by the group `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(String::as_str)
    }

    /// Returns `true` if the group `name` captured something.
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Returns the number of captured groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over `(name, text)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Captures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// HandlerOutput - Check handler return values
// ============================================================================

/// What the dispatch core makes of a handler's return value.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The handler returned nothing.
    Done,
    /// The handler returned a value instead of responding.
    Returned(String),
    /// The handler failed.
    Failed(anyhow::Error),
}

/// Types a route handler may return.
pub trait HandlerOutput: Send + 'static {
    /// Classifies this return value.
    fn into_outcome(self) -> HandlerOutcome;
}

impl HandlerOutput for () {
    fn into_outcome(self) -> HandlerOutcome {
        HandlerOutcome::Done
    }
}

impl HandlerOutput for String {
    fn into_outcome(self) -> HandlerOutcome {
        HandlerOutcome::Returned(self)
    }
}

impl HandlerOutput for &'static str {
    fn into_outcome(self) -> HandlerOutcome {
        HandlerOutcome::Returned(self.to_owned())
    }
}

impl<T: HandlerOutput> HandlerOutput for Option<T> {
    fn into_outcome(self) -> HandlerOutcome {
        match self {
            Some(t) => t.into_outcome(),
            None => HandlerOutcome::Done,
        }
    }
}

impl<T, E> HandlerOutput for Result<T, E>
where
    T: HandlerOutput,
    E: Into<anyhow::Error> + Send + 'static,
{
    fn into_outcome(self) -> HandlerOutcome {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => HandlerOutcome::Failed(e.into()),
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// A type-erased handler already bound to its plugin instance.
pub type BoxedHandler =
    Arc<dyn Fn(BoxedRequest, Captures) -> BoxFuture<'static, HandlerOutcome> + Send + Sync>;

/// One declared route.
#[derive(Clone)]
pub struct Route {
    /// The regular expression, as written.
    pub pattern: String,
    /// One-line description shown by the help listing.
    pub doc: Option<String>,
    /// The bound handler.
    pub handler: BoxedHandler,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

/// The ordered route table of one plugin.
#[derive(Clone, Debug, Default)]
pub struct Routes {
    entries: Vec<Route>,
}

impl Routes {
    /// Starts a table whose handlers are bound to `plugin`.
    pub fn builder<P>(plugin: Arc<P>) -> RoutesBuilder<P>
    where
        P: Send + Sync + 'static,
    {
        RoutesBuilder {
            plugin,
            entries: Vec::new(),
        }
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the routes in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.entries.iter()
    }
}

impl IntoIterator for Routes {
    type Item = Route;
    type IntoIter = std::vec::IntoIter<Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds a [`Routes`] table for the plugin `P`.
pub struct RoutesBuilder<P> {
    plugin: Arc<P>,
    entries: Vec<Route>,
}

impl<P> RoutesBuilder<P>
where
    P: Send + Sync + 'static,
{
    /// Adds a route without a description.
    pub fn route<F, Fut, R>(self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<P>, BoxedRequest, Captures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: HandlerOutput,
    {
        self.push(pattern.into(), None, handler)
    }

    /// Adds a route with a one-line description.
    pub fn route_with_doc<F, Fut, R>(
        self,
        pattern: impl Into<String>,
        doc: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<P>, BoxedRequest, Captures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: HandlerOutput,
    {
        self.push(pattern.into(), Some(doc.into()), handler)
    }

    fn push<F, Fut, R>(mut self, pattern: String, doc: Option<String>, handler: F) -> Self
    where
        F: Fn(Arc<P>, BoxedRequest, Captures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: HandlerOutput,
    {
        let plugin = Arc::clone(&self.plugin);
        let handler: BoxedHandler = Arc::new(move |request: BoxedRequest, captures: Captures| {
            let fut = handler(Arc::clone(&plugin), request, captures);
            async move { fut.await.into_outcome() }.boxed()
        });
        self.entries.push(Route {
            pattern,
            doc,
            handler,
        });
        self
    }

    /// Finishes the table.
    pub fn build(self) -> Routes {
        Routes {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Routable;

    struct Greeter;

    impl Greeter {
        async fn hello(self: Arc<Self>, _req: BoxedRequest, _caps: Captures) {}

        async fn shout(self: Arc<Self>, _req: BoxedRequest, _caps: Captures) -> String {
            "HELLO".into()
        }
    }

    #[test]
    fn test_builder_keeps_declaration_order() {
        let routes = Routes::builder(Arc::new(Greeter))
            .route_with_doc("hello", "Says hello.", Greeter::hello)
            .route("shout", Greeter::shout)
            .route("hi", Greeter::hello)
            .build();

        let patterns: Vec<_> = routes.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["hello", "shout", "hi"]);
        assert_eq!(routes.iter().next().unwrap().doc.as_deref(), Some("Says hello."));
        assert!(routes.iter().nth(1).unwrap().doc.is_none());
    }

    struct Todo;

    #[crate::routes]
    impl Todo {
        ///
        /// Adds a task.
        /// More text.
        #[route("todo (?P<text>.+)")]
        #[route("remind me to (?P<text>.+)")]
        async fn add(self: Arc<Self>, _req: BoxedRequest, caps: Captures) -> String {
            self.label(caps.get("text").unwrap_or_default())
        }

        #[route("list")]
        async fn list(self: Arc<Self>, _req: BoxedRequest, _caps: Captures) {}

        /// Slow.
        #[route("slow")]
        async fn slow(self: Arc<Self>, _req: BoxedRequest, _caps: Captures) {}

        fn label(&self, text: &str) -> String {
            format!("todo: {text}")
        }
    }

    #[test]
    fn test_routes_macro_table() {
        let routes = Arc::new(Todo).routes();

        let table: Vec<_> = routes
            .iter()
            .map(|r| (r.pattern.as_str(), r.doc.as_deref()))
            .collect();
        assert_eq!(
            table,
            [
                ("todo (?P<text>.+)", Some("Adds a task.")),
                ("remind me to (?P<text>.+)", Some("Adds a task.")),
                ("list", None),
                ("slow", Some("Slow.")),
            ]
        );
        assert_eq!(Todo.label("milk"), "todo: milk");
    }

    #[test]
    fn test_outcome_classification() {
        assert!(matches!(().into_outcome(), HandlerOutcome::Done));
        assert!(matches!(
            "x".into_outcome(),
            HandlerOutcome::Returned(s) if s == "x"
        ));
        assert!(matches!(
            None::<String>.into_outcome(),
            HandlerOutcome::Done
        ));
        assert!(matches!(
            Ok::<_, anyhow::Error>(()).into_outcome(),
            HandlerOutcome::Done
        ));
        assert!(matches!(
            Ok::<_, anyhow::Error>(String::from("y")).into_outcome(),
            HandlerOutcome::Returned(_)
        ));
        assert!(matches!(
            Err::<(), _>(anyhow::anyhow!("boom")).into_outcome(),
            HandlerOutcome::Failed(e) if e.to_string() == "boom"
        ));
    }

    #[test]
    fn test_captures_lookup() {
        let caps: Captures = [("this".to_owned(), "Umputun".to_owned())]
            .into_iter()
            .collect();
        assert_eq!(caps.get("this"), Some("Umputun"));
        assert!(caps.get("that").is_none());
        assert_eq!(caps.len(), 1);
    }
}
