//! Relay Bot
//!
//! A console bot with the reminder plugin.
//!
//! ```bash
//! cargo run --package relay-bot -- --plugins reminder --verbose
//! ```
//!
//! Configuration is read from `relay.toml` (and `relay.{profile}.toml`) in
//! the working directory or `~/.config/relay/`, then from `RELAY_*`
//! environment variables. Command-line flags win over both.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use relay::prelude::*;
use relay::runtime::ConfigLoader;
use relay::runtime::config::{LogLevel, LogOutput, StorageBackend};
use relay_adapter_console::CONSOLE_ADAPTER;
use relay_plugin_reminder::REMINDER_PLUGIN;

#[derive(Debug, Parser)]
#[command(name = "relay-bot", version, about = "A console chat bot built on Relay")]
struct Cli {
    /// Configuration file to use instead of the search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Adapters to start.
    #[arg(short, long, value_delimiter = ',')]
    adapters: Vec<String>,

    /// Plugins to load.
    #[arg(short, long, value_delimiter = ',')]
    plugins: Vec<String>,

    /// Where to keep plugin data.
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Keep plugin data in memory only.
    #[arg(long, conflicts_with = "storage")]
    memory: bool,

    /// Where to write the log.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log debug messages.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load(self) -> Result<RelayConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        let mut config = loader.load()?;

        if !self.adapters.is_empty() {
            config.adapters = self.adapters;
        }
        if !self.plugins.is_empty() {
            config.plugins = self.plugins;
        }
        if let Some(path) = self.storage {
            config.storage.backend = StorageBackend::File;
            config.storage.path = path;
        }
        if self.memory {
            config.storage.backend = StorageBackend::Memory;
        }
        if let Some(path) = self.log_file {
            config.logging.output = LogOutput::File;
            config.logging.file_path = Some(path);
        }
        if self.verbose {
            config.logging.level = LogLevel::Debug;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().load()?;

    let runtime = RelayRuntime::builder()
        .config(config)
        .register_adapter(CONSOLE_ADAPTER)
        .register_plugin(REMINDER_PLUGIN)
        .build()
        .await?;

    runtime.run().await?;
    Ok(())
}
