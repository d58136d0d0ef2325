//! The help listing.
//!
//! Answers `help` with one line per registered pattern, sorted:
//!
//! ```text
//! I support following commands:
//!   find (?P<this>.*) — Making a fake search of the term.
//!   help — Shows a help.
//!   show me a cat — Shows a cat.
//! ```
//!
//! Patterns without a description are listed bare.

use std::sync::{Arc, OnceLock};

use relay_core::BoxedRequest;

use crate::capability::Binding;
use crate::plugin::{Plugin, PluginDescriptor};
use crate::routes;
use crate::routing::Captures;

/// First line of every listing.
pub const HEADER: &str = "I support following commands:";

/// Descriptor of the built-in help plugin.
pub static HELP_PLUGIN: PluginDescriptor = PluginDescriptor {
    name: "help",
    create: |_ctx| Ok(Arc::new(HelpPlugin::new())),
};

/// Lists every binding of the running bot.
///
/// The listing is rendered once, by [`publish`](Self::publish), after all
/// bindings are known.
#[derive(Debug, Default)]
pub struct HelpPlugin {
    listing: OnceLock<String>,
}

impl HelpPlugin {
    /// Creates a plugin with an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders and freezes the listing. Later calls are ignored.
    pub fn publish(&self, bindings: &[Binding]) {
        let _ = self.listing.set(render(bindings));
    }

    /// Returns the current listing text.
    pub fn listing(&self) -> &str {
        self.listing.get().map_or(HEADER, String::as_str)
    }
}

#[routes]
impl HelpPlugin {
    /// Shows a help.
    #[route("help")]
    async fn help(self: Arc<Self>, request: BoxedRequest, _: Captures) -> anyhow::Result<()> {
        request.respond(self.listing()).await?;
        Ok(())
    }
}

impl Plugin for HelpPlugin {}

/// Renders the listing for `bindings`.
pub fn render(bindings: &[Binding]) -> String {
    let mut lines: Vec<String> = bindings
        .iter()
        .map(|b| match b.doc() {
            Some(doc) => format!("  {} — {}", b.pattern(), doc),
            None => format!("  {}", b.pattern()),
        })
        .collect();
    lines.sort();
    lines.insert(0, HEADER.to_owned());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::collect;
    use crate::plugin::{PluginContext, Routable};
    use crate::routing::Routes;
    use relay_core::Store;

    struct Cats;

    impl Cats {
        async fn show(self: Arc<Self>, _: BoxedRequest, _: Captures) {}
        async fn find(self: Arc<Self>, _: BoxedRequest, _: Captures) {}
    }

    impl Routable for Cats {
        fn routes(self: Arc<Self>) -> Routes {
            Routes::builder(self)
                .route_with_doc("show me a cat", "Shows a cat.", Cats::show)
                .route_with_doc(
                    "find (?P<this>.*)",
                    "Making a fake search of the term.",
                    Cats::find,
                )
                .build()
        }
    }

    impl Plugin for Cats {}

    fn bindings_with_help(help: Arc<HelpPlugin>) -> Vec<Binding> {
        let mut bindings = collect("cats", Arc::new(Cats)).unwrap();
        bindings.extend(collect("help", help).unwrap());
        bindings
    }

    #[test]
    fn test_listing_is_sorted_with_header() {
        let help = Arc::new(HelpPlugin::new());
        let bindings = bindings_with_help(Arc::clone(&help));
        help.publish(&bindings);

        assert_eq!(
            help.listing(),
            "I support following commands:\n  \
             find (?P<this>.*) — Making a fake search of the term.\n  \
             help — Shows a help.\n  \
             show me a cat — Shows a cat."
        );
    }

    #[test]
    fn test_undocumented_pattern_is_listed_bare() {
        struct Bare;
        impl Bare {
            async fn pet(self: Arc<Self>, _: BoxedRequest, _: Captures) {}
        }
        impl Routable for Bare {
            fn routes(self: Arc<Self>) -> Routes {
                Routes::builder(self).route("pet the cat", Bare::pet).build()
            }
        }
        impl Plugin for Bare {}

        let bindings = collect("bare", Arc::new(Bare)).unwrap();
        assert_eq!(render(&bindings), "I support following commands:\n  pet the cat");
    }

    #[test]
    fn test_descriptor_builds_help_plugin() {
        let plugin = HELP_PLUGIN
            .instantiate(PluginContext::new("help", Store::in_memory()))
            .unwrap();
        let help = plugin.clone().as_any().downcast::<HelpPlugin>().unwrap();
        assert_eq!(help.listing(), HEADER);

        let bindings = collect("help", plugin).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].pattern(), "help");
        assert_eq!(bindings[0].doc(), Some("Shows a help."));
    }
}
