//! Built-in plugins shipped with the Relay framework.
//!
//! | Plugin | Name | Description |
//! |--------|------|-------------|
//! | [`HELP_PLUGIN`] | `"help"` | Lists every registered pattern |
//!
//! The runtime always loads [`HELP_PLUGIN`] after the configured plugins, so
//! its own `help` route is tried last.

pub mod help;

pub use help::{HELP_PLUGIN, HelpPlugin};
