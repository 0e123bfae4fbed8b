//! Trellis - route resolution and incremental builds for component-based sites.

mod actor;
mod asset;
mod cli;
mod compiler;
mod config;
mod core;
mod generator;
mod graph;
mod logger;
mod pipeline;
mod pool;
mod route;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Before any blocking work, so Ctrl+C during the first build is seen.
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Build { build_args } => cli::build::build_site(&cli, build_args),
        Commands::Watch => cli::watch::watch_site(&cli),
        Commands::Routes { api } => cli::routes::print_routes(&cli, *api),
    }
}
