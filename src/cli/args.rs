//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Route resolution and incremental builds for component-based sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file name, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = crate::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: (),

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site once; any structural error fails the build
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then rebuild incrementally on every change
    #[command(visible_alias = "w")]
    Watch,

    /// Print the route table as JSON
    #[command(visible_alias = "r")]
    Routes {
        /// Print API endpoints only
        #[arg(long)]
        api: bool,
    },
}

/// One-shot build overrides for `[build]`.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Minify externalized package modules
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Number of route workers (0 = one per core)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_overrides() {
        let cli = Cli::try_parse_from(["trellis", "build", "--minify", "-j", "3"]).unwrap();
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.minify, Some(true));
        assert_eq!(build_args.workers, Some(3));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["trellis", "watch", "-V", "-C", "site.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(matches!(cli.command, Commands::Watch));
    }

    #[test]
    fn test_routes_api_flag() {
        let cli = Cli::try_parse_from(["trellis", "routes", "--api"]).unwrap();
        assert!(matches!(cli.command, Commands::Routes { api: true }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
