//! `trellis build`: one-shot production build.

use std::sync::Arc;

use anyhow::Result;

use super::{BuildArgs, Cli, load_settings};
use crate::core::BuildMode;
use crate::pipeline::Builder;

pub fn build_site(cli: &Cli, args: &BuildArgs) -> Result<()> {
    let mut settings = load_settings(cli, BuildMode::ONE_SHOT)?;
    apply_overrides(&mut settings.config.build, args);

    Builder::new(Arc::new(settings)).full_build()?;
    Ok(())
}

fn apply_overrides(build: &mut crate::config::BuildSectionConfig, args: &BuildArgs) {
    if let Some(minify) = args.minify {
        build.minify = minify;
    }
    if let Some(workers) = args.workers {
        build.workers = workers;
    }
}
