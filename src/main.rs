// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use lidar_mesh::Config;
use lidar_mesh::constants::DEFAULT_LOG_FILTER;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "lidar-mesh")]
#[command(about = "Mesh reconstruction and depth metrics for depth-sensing cameras")]
#[command(version = lidar_mesh::constants::app_info::version())]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a capture record into a GLB scene
    Reconstruct {
        /// Capture record (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (default: <export dir>/scene_TIMESTAMP.glb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project texture coordinates and embed this captured image
        #[arg(short, long)]
        texture: Option<PathBuf>,
    },

    /// Print depth metrics for the depth map of a capture record
    Metrics {
        /// Capture record (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging before anything else logs
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=lidar_mesh=debug, RUST_LOG=info
    let env_override = std::env::var_os("RUST_LOG").is_some();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_level(true)
        .with_filter_reloading();
    let filter_handle = builder.reload_handle();
    builder.init();

    let config = Config::load_or_default(cli.config.as_deref())?;
    // The configured filter only applies when RUST_LOG is not set
    if !env_override {
        filter_handle.reload(EnvFilter::new(&config.log_filter))?;
    }
    debug!(filter = %config.log_filter, "Configuration loaded");

    match cli.command {
        Commands::Reconstruct {
            input,
            output,
            texture,
        } => cli::reconstruct(config, &input, output, texture),
        Commands::Metrics { input } => cli::print_metrics(config, &input),
    }
}
