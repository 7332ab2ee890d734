/// CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::AppConfig;

// Build timestamp injected at compile time by build.rs
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser, Debug)]
#[command(name = "pm1-monitor")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Controller address (overrides the config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Polling interval in milliseconds
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Start with live update switched off
    #[arg(long, global = true)]
    pub paused: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Command line options win over file values
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
        if self.paused {
            config.live_update = false;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll once and print the display panel and table
    List {
        /// Print the raw channel records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show controller name, version and state
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// View effective configuration
    View,

    /// Print the config file location
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
