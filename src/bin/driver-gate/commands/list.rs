//! `driver-gate list` command

use anyhow::Result;
use serde_json::json;

use crate::cli::{GlobalArgs, ListArgs};
use crate::commands::{context, require_source_dir};
use driver_gate::core::{discover, SourceFileState};
use driver_gate::ops::build_env::BuildEnvironment;
use driver_gate::util::Shell;

pub fn execute(args: ListArgs, global: &GlobalArgs, shell: &Shell) -> Result<()> {
    let (ctx, config) = context(global)?;

    let source_dir = require_source_dir(&ctx, args.source_dir.as_deref(), &config)?;
    let layout = config.layout();
    let registry = discover(&source_dir, &layout)?;

    let env = BuildEnvironment::load(&ctx.env_file(None, &config))?;
    let record = env
        .include_record(config.define_name(), config.option_key())?
        .record;

    if shell.is_json() {
        let drivers: Vec<_> = registry
            .iter()
            .map(|(id, state)| {
                let file = match state {
                    SourceFileState::Enabled => layout.canonical_file_name(id),
                    SourceFileState::Disabled => layout.disabled_file_name(id),
                };
                json!({
                    "id": id,
                    "state": state,
                    "file": file,
                    "selected": record.contains(id),
                })
            })
            .collect();

        shell.json_event(&json!({
            "reason": "drivers",
            "source_dir": source_dir,
            "unrestricted": record.is_unrestricted(),
            "drivers": drivers,
        }));
        return Ok(());
    }

    if registry.is_empty() {
        shell.note(format!("no drivers found in {}", source_dir.display()));
        return Ok(());
    }

    let width = registry.ids().map(|id| id.as_str().len()).max().unwrap_or(0);
    for (id, state) in registry.iter() {
        let marker = if record.contains(id) { "*" } else { " " };
        shell.println(format!("{} {:<width$}  {}", marker, id, state, width = width));
    }

    Ok(())
}
