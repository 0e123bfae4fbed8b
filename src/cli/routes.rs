//! `trellis routes`: compile, map and print the route table as JSON.
//!
//! Nothing is rendered and no packages are vendored. Conflicts are reported
//! but do not stop the table from printing.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::{Cli, load_settings};
use crate::core::BuildMode;
use crate::pipeline::Builder;
use crate::route::{RouteTable, print_conflicts};

pub fn print_routes(cli: &Cli, api: bool) -> Result<()> {
    let settings = load_settings(cli, BuildMode::WATCH)?;
    let builder = Builder::new(Arc::new(settings)).quiet(true);
    builder.compile_all()?;
    let snapshot = builder.collect()?;

    if !snapshot.routes.conflicts().is_empty() {
        print_conflicts(snapshot.routes.conflicts());
    }

    let json = render(&snapshot.routes, api)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write route table")?;
    Ok(())
}

fn render(table: &RouteTable, api: bool) -> Result<String> {
    let json = if api {
        serde_json::to_string_pretty(table.endpoints())?
    } else {
        serde_json::to_string_pretty(table)?
    };
    Ok(json)
}
