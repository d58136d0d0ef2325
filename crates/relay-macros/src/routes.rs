//! `#[routes]` attribute implementation.
//!
//! # Input
//!
//! An inherent `impl` block whose handler methods carry one or more
//! `#[route("pattern")]` attributes:
//!
//! ```rust,ignore
//! #[routes]
//! impl Todo {
//!     /// Adds a task.
//!     #[route("todo (?P<text>.+)")]
//!     #[route("remind me to (?P<text>.+)")]
//!     async fn add(self: Arc<Self>, request: BoxedRequest, caps: Captures) -> anyhow::Result<()> {
//!         // ...
//!     }
//! }
//! ```
//!
//! # Output
//!
//! The same `impl` block with the `#[route]` attributes removed, plus
//!
//! ```rust,ignore
//! impl ::relay_framework::plugin::Routable for Todo {
//!     fn routes(self: Arc<Self>) -> Routes {
//!         Routes::builder(self)
//!             .route_with_doc("todo (?P<text>.+)", "Adds a task.", Self::add)
//!             .route_with_doc("remind me to (?P<text>.+)", "Adds a task.", Self::add)
//!             .build()
//!     }
//! }
//! ```
//!
//! Routes keep declaration order: methods top to bottom, then attributes top
//! to bottom. The description is the first non-empty line of the method's doc
//! comment.
//!
//! # Arguments
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `crate` | `crate = ::relay::framework` | Path to `relay_framework` (default `::relay_framework`) |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Expr, ExprLit, ImplItem, ItemImpl, Lit, LitStr, Meta, Path, Token,
    parse::{Parse, ParseStream, Result},
    spanned::Spanned,
};

// ─── Arguments ────────────────────────────────────────────────────────────────

/// Parsed `#[routes(...)]` arguments.
pub struct RoutesArgs {
    krate: Option<Path>,
}

impl Parse for RoutesArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut krate = None;
        while !input.is_empty() {
            input.parse::<Token![crate]>()?;
            input.parse::<Token![=]>()?;
            krate = Some(input.call(Path::parse_mod_style)?);
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(Self { krate })
    }
}

// ─── Collection ───────────────────────────────────────────────────────────────

/// One `(pattern, description, method)` entry.
struct RouteEntry {
    pattern: LitStr,
    doc: Option<String>,
    method: syn::Ident,
}

fn is_route(attr: &Attribute) -> bool {
    attr.path().is_ident("route")
}

/// First non-empty line of the `///` comments.
fn first_doc_line(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|doc| {
            doc.lines()
                .map(|line| line.trim().to_owned())
                .collect::<Vec<_>>()
        })
        .find(|line| !line.is_empty())
}

// ─── Expansion ────────────────────────────────────────────────────────────────

pub fn expand(args: RoutesArgs, mut item: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[routes] must be placed on an inherent impl block",
        ));
    }

    let mut entries = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let (routes, rest): (Vec<_>, Vec<_>) = method.attrs.drain(..).partition(is_route);
        method.attrs = rest;
        if routes.is_empty() {
            continue;
        }

        if method.sig.asyncness.is_none() {
            return Err(syn::Error::new(
                method.sig.fn_token.span(),
                "route handlers must be `async fn`",
            ));
        }

        let doc = first_doc_line(&method.attrs);
        for attr in routes {
            let pattern: LitStr = attr.parse_args()?;
            entries.push(RouteEntry {
                pattern,
                doc: doc.clone(),
                method: method.sig.ident.clone(),
            });
        }
    }

    let krate = args
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::relay_framework));
    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    let calls = entries.iter().map(|entry| {
        let pattern = &entry.pattern;
        let method = &entry.method;
        match &entry.doc {
            Some(doc) => quote! { .route_with_doc(#pattern, #doc, Self::#method) },
            None => quote! { .route(#pattern, Self::#method) },
        }
    });

    Ok(quote! {
        #item

        impl #impl_generics #krate::plugin::Routable for #self_ty #where_clause {
            fn routes(self: ::std::sync::Arc<Self>) -> #krate::routing::Routes {
                #krate::routing::Routes::builder(self)
                    #(#calls)*
                    .build()
            }
        }
    })
}
