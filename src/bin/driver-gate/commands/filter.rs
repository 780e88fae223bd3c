//! `driver-gate filter` command
//!
//! Runs right before compilation, possibly in a different process from
//! `configure`, so the selection comes from the build environment file
//! unless given explicitly.

use anyhow::{bail, Result};

use crate::cli::{FilterArgs, GlobalArgs};
use crate::commands::{context, require_source_dir};
use driver_gate::core::BuildEnvironmentRecord;
use driver_gate::ops::build_env::{BuildEnvironment, RecordSource};
use driver_gate::ops::filter::{filter_drivers, FilterOutcome};
use driver_gate::util::diagnostic::{emit, suggestions, Diagnostic};
use driver_gate::util::shell::Status;
use driver_gate::util::Shell;

pub fn execute(args: FilterArgs, global: &GlobalArgs, shell: &Shell) -> Result<()> {
    let (ctx, config) = context(global)?;

    let source_dir = require_source_dir(&ctx, args.source_dir.as_deref(), &config)?;
    let layout = config.layout();

    let record = match &args.include {
        Some(raw) => BuildEnvironmentRecord::parse(raw)?,
        None => {
            let env_file = ctx.env_file(args.env_file.as_deref(), &config);
            let env = BuildEnvironment::load(&env_file)?;
            let lookup = env.include_record(config.define_name(), config.option_key())?;

            if let RecordSource::Disagreement { option, define } = &lookup.source {
                shell.warn(format!(
                    "{} says `{}` but {} says `{}`; using `{}`",
                    config.option_key(),
                    option,
                    config.define_name(),
                    define,
                    option
                ));
            }
            lookup.record
        }
    };

    shell.status(Status::Filtering, source_dir.display());

    let report = filter_drivers(&source_dir, &record, &layout)?;

    if shell.is_json() {
        let mut event = serde_json::to_value(&report)?;
        event["reason"] = "filtered".into();
        shell.json_event(&event);
    } else {
        for name in &report.restored {
            shell.status(Status::Restored, name);
        }
        for name in &report.excluded {
            shell.status(Status::Disabled, name);
        }
        for name in &report.kept {
            shell.status(Status::Kept, name);
        }
        for id in &report.missing {
            shell.warn(format!("selected driver `{}` has no source file", id));
        }
        for failure in &report.failures {
            let diag = Diagnostic::warning(format!("could not {} driver file", failure.action))
                .with_location(&failure.path)
                .with_context(failure.reason.clone());
            if !shell.is_quiet() {
                emit(&diag, shell.use_color());
            }
        }

        match report.outcome {
            FilterOutcome::MissingSourceDir => shell.status(
                Status::Skipped,
                format!("{} does not exist; nothing to filter", source_dir.display()),
            ),
            FilterOutcome::Unrestricted => shell.status(
                Status::Skipped,
                "no driver selection recorded; sources left untouched",
            ),
            FilterOutcome::Filtered => shell.status(
                Status::Finished,
                format!(
                    "{} kept, {} excluded, {} restored, {} previously disabled",
                    report.kept.len(),
                    report.excluded.len(),
                    report.restored.len(),
                    report.previously_disabled
                ),
            ),
        }
    }

    if args.deny_failures && !report.is_clean() {
        bail!(
            "{} driver file(s) could not be renamed\nhelp: {}",
            report.failures.len(),
            suggestions::FILTER_FAILED
        );
    }

    Ok(())
}
