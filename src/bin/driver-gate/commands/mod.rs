//! Command implementations

pub mod completions;
pub mod configure;
pub mod filter;
pub mod list;
pub mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::cli::GlobalArgs;
use driver_gate::util::diagnostic::suggestions;
use driver_gate::util::{Config, GlobalContext, Shell};

/// Build the output shell from the global flags.
pub fn shell(global: &GlobalArgs) -> Shell {
    Shell::from_flags(global.quiet, global.verbose, global.color, global.json)
}

/// Build the context and load the merged configuration.
pub fn context(global: &GlobalArgs) -> Result<(GlobalContext, Config)> {
    let mut ctx = GlobalContext::new()?;
    if let Some(path) = &global.config {
        ctx = ctx.with_config_path(path.clone());
    }
    if global.no_global_config {
        ctx = ctx.without_global_config();
    }

    let config = ctx.load_config()?;
    Ok((ctx, config))
}

/// Source directory from the command line or config; required.
pub fn require_source_dir(
    ctx: &GlobalContext,
    cli: Option<&Path>,
    config: &Config,
) -> Result<PathBuf> {
    match ctx.source_dir(cli, config) {
        Some(dir) => Ok(dir),
        None => bail!(
            "no driver source directory configured\nhelp: {}",
            suggestions::NO_CONFIG
        ),
    }
}
