//! CLI module for Innsikt.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Innsikt - Podcast Insight Capture
///
/// Capture key takeaways from the podcast you are listening to right now.
/// The name "Innsikt" comes from the Norwegian word for "insight."
#[derive(Parser, Debug)]
#[command(name = "innsikt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Capture an insight from an episode right now
    Capture {
        /// Episode title as shown in your player
        title: String,

        /// Show name, used to pick the right episode among matches
        #[arg(short, long)]
        show: Option<String>,

        /// Playback position (seconds or MM:SS)
        #[arg(short = 'a', long, value_parser = commands::parse_position, default_value = "0")]
        at: u32,

        /// Player URL for the episode, if you have one
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Start the HTTP API server the browser extension talks to
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
