//! Command-line interface definition.

use std::net::IpAddr;
use std::path::PathBuf;

use calsync_core::DuplicateRule;
use clap::{Parser, Subcommand};

/// calsync - keep a Google calendar in sync from the command line
#[derive(Debug, Parser)]
#[command(name = "calsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize calsync and store the credential
    Auth {
        /// Discard the stored credential and authorize again
        #[arg(long)]
        force: bool,
    },

    /// List upcoming events
    List {
        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an event from a JSON file unless it already exists
    Create {
        /// Event in Calendar API JSON format
        file: PathBuf,

        /// Override the configured duplicate rule
        #[arg(long)]
        rule: Option<DuplicateRule>,
    },

    /// Serve upcoming events over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        bind: Option<IpAddr>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Show which configuration file is used
    Path,
}
