//! `driver-gate manifest` command
//!
//! Prints the compile inputs a host collecting sources from the component
//! directory would see once the recorded selection is applied.

use anyhow::Result;
use serde_json::json;

use crate::cli::{GlobalArgs, ManifestArgs};
use crate::commands::{context, require_source_dir};
use driver_gate::core::discover;
use driver_gate::ops::build_env::BuildEnvironment;
use driver_gate::ops::manifest_filter::ResourceFilter;
use driver_gate::sources::{ResourceSource, SourceCollector};
use driver_gate::util::fs::relative_path;
use driver_gate::util::Shell;

pub fn execute(args: ManifestArgs, global: &GlobalArgs, shell: &Shell) -> Result<()> {
    let (ctx, config) = context(global)?;

    let source_dir = require_source_dir(&ctx, args.source_dir.as_deref(), &config)?;
    let layout = config.layout();
    let registry = discover(&source_dir, &layout)?;

    let env = BuildEnvironment::load(&ctx.env_file(args.env_file.as_deref(), &config))?;
    let record = env
        .include_record(config.define_name(), config.option_key())?
        .record;

    let mut collector = SourceCollector::new();
    let resources = collector.widened(&layout.extension).collect(&source_dir)?;

    let filter = ResourceFilter::from_record(&record, &registry, layout);
    let kept: Vec<String> = filter
        .filter(resources)
        .iter()
        .map(|path| relative_path(&source_dir, path).display().to_string())
        .collect();

    if shell.is_json() {
        shell.json_event(&json!({
            "reason": "manifest",
            "source_dir": source_dir,
            "resources": kept,
        }));
        return Ok(());
    }

    for path in &kept {
        shell.println(path);
    }

    Ok(())
}
