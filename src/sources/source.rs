//! ResourceSource trait - the host's view of a component's source files.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Something that can list the source files of a component directory.
///
/// The build host owns the real implementation; driver-gate only consumes
/// the list and narrows it.
pub trait ResourceSource {
    /// List every resource under `root` the host would hand to the compiler.
    fn collect(&self, root: &Path) -> Result<Vec<PathBuf>>;
}
