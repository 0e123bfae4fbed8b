//! Command-line interface module.

mod args;
pub mod build;
pub mod routes;
pub mod watch;

pub use args::{BuildArgs, Cli, Commands};

use anyhow::Result;

use crate::config::{Settings, SiteConfig};
use crate::core::BuildMode;
use crate::debug;

/// Locate the config file and resolve settings for `mode`.
pub fn load_settings(cli: &Cli, mode: BuildMode) -> Result<Settings> {
    let config = SiteConfig::load(&cli.config)?;
    debug!("config"; "loaded {}", config.config_path.display());
    Ok(Settings::resolve(config, mode)?)
}
