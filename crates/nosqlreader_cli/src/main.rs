//! NoSQL Reader CLI
//!
//! Command-line tools for DataReader servers and captured change batches.
//!
//! # Commands
//!
//! - `watch` - Mirror tables from a live server and log every event
//! - `decode` - Dump a captured change batch
//! - `version` - Show version information

mod client;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// NoSQL data reader command-line tools.
#[derive(Parser)]
#[command(name = "nosqlreader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror tables from a DataReader server and log every event
    Watch {
        /// Server base URL (e.g. http://nosql:5123)
        #[arg(long)]
        host: String,

        /// Table to subscribe to (repeatable)
        #[arg(short, long = "table", required = true)]
        tables: Vec<String>,

        /// Application name sent in the greeting
        #[arg(long, default_value = "nosqlreader-cli")]
        app_name: String,

        /// Client version sent in the greeting
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        app_version: String,

        /// Delay before reconnecting after a failure, in milliseconds
        #[arg(long, default_value = "3000")]
        reconnect_delay_ms: u64,

        /// Per-request timeout, in seconds
        #[arg(long, default_value = "60")]
        request_timeout_secs: u64,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Log payloads as text
        #[arg(short, long)]
        payloads: bool,
    },

    /// Dump a captured change batch
    Decode {
        /// File holding the raw GetChanges body
        input: PathBuf,

        /// Maximum number of events to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Watch {
            host,
            tables,
            app_name,
            app_version,
            reconnect_delay_ms,
            request_timeout_secs,
            duration_secs,
            payloads,
        } => {
            let options = commands::watch::WatchOptions {
                host,
                tables,
                app_name,
                app_version,
                reconnect_delay_ms,
                request_timeout_secs,
                duration_secs,
                payloads,
            };
            commands::watch::run(options)?;
        }
        Commands::Decode {
            input,
            limit,
            format,
        } => {
            commands::decode::run(&input, limit, &format)?;
        }
        Commands::Version => {
            println!("NoSQL Reader CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
