//! Console adapter for the Relay bot runtime.
//!
//! Reads one request per line from stdin and prints every response on its
//! own line. End of input, `exit` or `quit` sends the exit signal.
//!
//! ```toml
//! adapters = ["console"]
//!
//! [settings.console]
//! prompt = "> "
//! user = "alice"
//! ```

mod adapter;
mod config;

pub use adapter::{CONSOLE_ADAPTER, ConsoleAdapter, ConsoleRequest};
pub use config::ConsoleSettings;
