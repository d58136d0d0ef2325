//! Procedural macros for the Relay bot runtime.
//!
//! This crate provides:
//!
//! - `#[routes]` - Turns `#[route("...")]`-tagged handler methods into a
//!   plugin route table
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
//! ```

mod routes;

use proc_macro::TokenStream;
use syn::{ItemImpl, parse_macro_input};

/// Generates a `Routable` implementation from `#[route]` attributes.
///
/// # Attributes
///
/// - `#[route("pattern")]` on an `async fn` - Registers the method for
///   `pattern`. Repeat the attribute to register more patterns.
/// - `#[routes(crate = path)]` - Overrides the path to `relay_framework`.
///
/// The first line of a method's doc comment becomes the route description
/// shown by the help listing.
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as routes::RoutesArgs);
    let item = parse_macro_input!(item as ItemImpl);

    match routes::expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
