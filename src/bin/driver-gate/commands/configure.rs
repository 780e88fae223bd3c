//! `driver-gate configure` command

use anyhow::Result;

use crate::cli::{ConfigureArgs, GlobalArgs};
use crate::commands::{context, require_source_dir};
use driver_gate::core::SelectionInput;
use driver_gate::ops::configure::{configure, ConfigureOptions};
use driver_gate::ops::propagate::Propagation;
use driver_gate::util::shell::Status;
use driver_gate::util::Shell;

pub fn execute(args: ConfigureArgs, global: &GlobalArgs, shell: &Shell) -> Result<()> {
    let (ctx, config) = context(global)?;

    let source_dir = require_source_dir(&ctx, args.source_dir.as_deref(), &config)?;
    let env_file = ctx.env_file(args.env_file.as_deref(), &config);

    // CLI overrides config
    let mut opts = ConfigureOptions::from_config(&config, source_dir, env_file);
    if let Some(drivers) = &args.drivers {
        opts.selection = Some(SelectionInput::from_cli(drivers));
    }
    if args.strict {
        opts.validate.permissive = false;
    }

    shell.status(Status::Discovering, opts.source_dir.display());

    let result = configure(&opts)?;

    if shell.is_json() {
        let mut event = serde_json::to_value(&result)?;
        event["reason"] = "configured".into();
        event["available"] = result.registry.names().into();
        shell.json_event(&event);
        return Ok(());
    }

    for instance in &result.instances {
        shell.status(
            Status::Info,
            format!("instance `{}` uses {}", instance.name, instance.choice),
        );
    }

    match &result.propagation {
        Propagation::Recorded { value } => shell.status(
            Status::Configured,
            format!(
                "{} of {} drivers ({}) in {}",
                result.selection.len(),
                result.registry.len(),
                value,
                result.env_file.display()
            ),
        ),
        Propagation::Skipped { cleared_stale } => {
            let mut msg = "no drivers selected; all drivers will be built".to_string();
            if *cleared_stale {
                msg.push_str(" (cleared previous selection)");
            }
            shell.status(Status::Skipped, msg);
        }
    }

    Ok(())
}
