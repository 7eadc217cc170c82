// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polycast - publish to and monitor many social platforms at once.
//!
//! This is the binary entry point.

mod connect;
mod platforms;
mod post;
mod status;
mod validate;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use polycast_config::PolycastConfig;

/// Polycast - one adapter interface for many social platforms.
#[derive(Parser, Debug)]
#[command(name = "polycast", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in platforms and their capabilities.
    Platforms {
        /// Only platforms whose name contains this text.
        query: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load the configuration and check every adapter entry.
    Validate {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Post text to every configured adapter.
    Post {
        /// Text of the post.
        text: String,
        /// Post only to these adapters (comma-separated registry names).
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Title, for platforms that need one.
        #[arg(long)]
        title: Option<String>,
        /// Tag to attach; may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Connect configured adapters and print their status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let color = !cli.plain && std::io::stdout().is_terminal();

    let outcome = match cli.command {
        Commands::Platforms { query, json } => {
            init_tracing("warn");
            platforms::run_platforms(query.as_deref(), json, color)
        }
        Commands::Validate { json } => {
            let config = load(cli.config.as_deref());
            validate::run_validate(&config, json, color)
        }
        Commands::Post {
            text,
            only,
            title,
            tags,
            json,
        } => {
            let config = load(cli.config.as_deref());
            let request = post::PostRequest {
                text,
                only,
                title,
                tags,
            };
            post::run_post(&config, &request, json, color).await
        }
        Commands::Status { json } => {
            let config = load(cli.config.as_deref());
            status::run_status(&config, json, color).await
        }
    };

    if let Err(err) = outcome {
        eprintln!("polycast: {err}");
        std::process::exit(1);
    }
}

/// Load and validate configuration, rendering diagnostics and exiting on
/// failure. Tracing is initialized with the configured level.
fn load(path: Option<&Path>) -> PolycastConfig {
    let loaded = match path {
        Some(path) => polycast_config::load_and_validate_path(path),
        None => polycast_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => {
            init_tracing(&config.manager.log_level);
            config
        }
        Err(errors) => {
            polycast_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Initialize the tracing subscriber. `POLYCAST_LOG` takes precedence over
/// `RUST_LOG`; without either, `log_level` applies to polycast crates.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("POLYCAST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("polycast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
