//! Conditional inclusion filter.
//!
//! Runs immediately before compilation. Reads the include record left by the
//! configuration phase and renames driver sources so that exactly the
//! selected drivers are visible to the compiler:
//!
//! 1. Restore: `driver_<id>.cc.off` -> `driver_<id>.cc` for selected drivers.
//! 2. Exclude: `driver_<id>.cc` -> `driver_<id>.cc.off` for everything else.
//!
//! Files already in the right state are not touched, so a second run with the
//! same record is a no-op. A rename that fails is recorded and the pass moves
//! on to the next file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::core::layout::{DriverLayout, SourceFileState};
use crate::core::record::BuildEnvironmentRecord;
use crate::util::fs::{glob_files, rename_no_clobber};

/// What the filter did overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    /// Files were brought in line with the record.
    Filtered,
    /// Empty record; the tree was left as found.
    Unrestricted,
    /// The source directory does not exist in this build.
    MissingSourceDir,
}

/// The rename a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameAction {
    Restore,
    Exclude,
}

impl fmt::Display for RenameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameAction::Restore => write!(f, "restore"),
            RenameAction::Exclude => write!(f, "exclude"),
        }
    }
}

/// A single file the filter could not rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterFailure {
    pub path: PathBuf,
    pub action: RenameAction,
    pub reason: String,
}

/// Result of one filter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub source_dir: PathBuf,
    pub outcome: FilterOutcome,
    /// Drivers named by the record
    pub selected: Vec<String>,
    /// Selected driver files that are enabled after the run
    pub kept: Vec<String>,
    /// Files re-enabled by this run
    pub restored: Vec<String>,
    /// Files disabled by this run
    pub excluded: Vec<String>,
    /// Files that were already disabled before this run and stayed disabled
    pub previously_disabled: usize,
    /// Selected drivers with no source file at all
    pub missing: Vec<String>,
    pub failures: Vec<FilterFailure>,
}

impl FilterReport {
    fn empty(source_dir: &Path, outcome: FilterOutcome, record: &BuildEnvironmentRecord) -> Self {
        FilterReport {
            source_dir: source_dir.to_path_buf(),
            outcome,
            selected: record.drivers().iter().map(|id| id.to_string()).collect(),
            kept: Vec::new(),
            restored: Vec::new(),
            excluded: Vec::new(),
            previously_disabled: 0,
            missing: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of files renamed by this run.
    pub fn changed(&self) -> usize {
        self.restored.len() + self.excluded.len()
    }

    /// True when every attempted rename succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bring the driver files in `source_dir` in line with `record`.
///
/// Errors are returned only for problems listing the directory; individual
/// rename failures end up in [`FilterReport::failures`].
pub fn filter_drivers(
    source_dir: &Path,
    record: &BuildEnvironmentRecord,
    layout: &DriverLayout,
) -> Result<FilterReport> {
    if !source_dir.is_dir() {
        tracing::warn!("driver source dir not found: {}", source_dir.display());
        return Ok(FilterReport::empty(
            source_dir,
            FilterOutcome::MissingSourceDir,
            record,
        ));
    }

    if record.is_unrestricted() {
        tracing::info!(
            "no selected drivers; leaving {} as-is",
            source_dir.display()
        );
        return Ok(FilterReport::empty(
            source_dir,
            FilterOutcome::Unrestricted,
            record,
        ));
    }

    tracing::debug!("filtering drivers in {}", source_dir.display());

    let include: BTreeSet<String> = record
        .drivers()
        .iter()
        .map(|id| layout.canonical_file_name(id))
        .collect();

    let mut report = FilterReport::empty(source_dir, FilterOutcome::Filtered, record);

    let glob_disabled = glob_files(source_dir, &[layout.disabled_glob()])?;
    let disabled: Vec<(&Path, &str)> = glob_disabled
        .iter()
        .filter_map(|path| driver_file(path, layout, SourceFileState::Disabled))
        .collect();
    let disabled_before = disabled.len();

    for (off_path, off_name) in disabled {
        let Some(base) = layout.strip_disabled_suffix(off_name) else {
            continue;
        };
        if !include.contains(base) {
            continue;
        }

        let target = source_dir.join(base);
        match rename_no_clobber(off_path, &target) {
            Ok(()) => {
                tracing::debug!("restored {}", base);
                report.restored.push(base.to_string());
            }
            Err(e) => report.fail(off_path, RenameAction::Restore, e),
        }
    }

    let glob_enabled = glob_files(source_dir, &[layout.enabled_glob()])?;
    let enabled = glob_enabled
        .iter()
        .filter_map(|path| driver_file(path, layout, SourceFileState::Enabled));

    for (path, base) in enabled {
        if include.contains(base) {
            report.kept.push(base.to_string());
            continue;
        }

        let target = source_dir.join(format!("{}.{}", base, layout.disabled_suffix));

        match rename_no_clobber(path, &target) {
            Ok(()) => {
                tracing::debug!("excluded {}", base);
                report.excluded.push(base.to_string());
            }
            Err(e) => report.fail(path, RenameAction::Exclude, e),
        }
    }

    report.previously_disabled = disabled_before.saturating_sub(report.restored.len());

    let present: BTreeSet<&str> = report.kept.iter().map(String::as_str).collect();
    report.missing = record
        .drivers()
        .iter()
        .filter(|id| !present.contains(layout.canonical_file_name(id).as_str()))
        .map(|id| id.to_string())
        .collect();

    for id in &report.missing {
        tracing::warn!("selected driver `{}` has no source file in {}", id, source_dir.display());
    }

    report.kept.sort();
    report.restored.sort();
    report.excluded.sort();

    tracing::info!(
        "include={:?} kept={:?} excluded={:?} restored={:?} previously_disabled={}",
        report.selected,
        report.kept,
        report.excluded,
        report.restored,
        report.previously_disabled
    );

    Ok(report)
}

impl FilterReport {
    fn fail(&mut self, path: &Path, action: RenameAction, err: std::io::Error) {
        tracing::warn!("failed to {} {}: {}", action, path.display(), err);
        self.failures.push(FilterFailure {
            path: path.to_path_buf(),
            action,
            reason: err.to_string(),
        });
    }
}

/// The file name of a globbed driver file, if it is one the filter may touch.
///
/// Names that match the glob but do not parse to a valid driver id in the
/// expected state are left alone, as discovery and the manifest filter do.
fn driver_file<'a>(
    path: &'a Path,
    layout: &DriverLayout,
    expected: SourceFileState,
) -> Option<(&'a Path, &'a str)> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        tracing::warn!("skipping driver file with non-UTF-8 name: {}", path.display());
        return None;
    };

    match layout.parse_file_name(name) {
        Some((_, state)) if state == expected => Some((path, name)),
        _ => {
            tracing::warn!("skipping driver-like file with invalid name: {}", path.display());
            None
        }
    }
}
