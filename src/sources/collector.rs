//! Extension-filtered source collection.
//!
//! Mirrors the build host's generic file collector: it only picks up files
//! whose extension is in a known set. Driver sources use an extension the
//! host does not normally compile (`.cc`), so discovery widens the set for
//! the duration of one collection and then puts it back, leaving sibling
//! components that share the collector unaffected.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::sources::ResourceSource;

/// Extensions the host collects by default.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "h", "hpp", "tcc", "ino"];

/// Recursive collector for files with known extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCollector {
    extensions: BTreeSet<String>,
}

impl SourceCollector {
    /// Create a collector with the host's default extensions.
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_SOURCE_EXTENSIONS.iter().copied())
    }

    /// Create a collector for a specific set of extensions (without dots).
    pub fn with_extensions<'a>(extensions: impl IntoIterator<Item = &'a str>) -> Self {
        SourceCollector {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Currently recognized extensions.
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn recognizes(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    /// Temporarily recognize `extension`.
    ///
    /// The returned guard restores the previous extension set when dropped.
    /// An extension that was already recognized stays recognized.
    pub fn widened(&mut self, extension: &str) -> WidenedCollector<'_> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        let added = self.extensions.insert(extension.clone());

        if added {
            tracing::debug!("collector: temporarily recognizing .{}", extension);
        }

        WidenedCollector {
            collector: self,
            added: added.then_some(extension),
        }
    }
}

impl Default for SourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSource for SourceCollector {
    fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry
                .with_context(|| format!("failed to walk source directory: {}", root.display()))?;

            if entry.file_type().is_file() && self.recognizes(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// A collector with one extra extension, restored on drop.
#[derive(Debug)]
pub struct WidenedCollector<'a> {
    collector: &'a mut SourceCollector,
    added: Option<String>,
}

impl Deref for WidenedCollector<'_> {
    type Target = SourceCollector;

    fn deref(&self) -> &SourceCollector {
        self.collector
    }
}

impl DerefMut for WidenedCollector<'_> {
    fn deref_mut(&mut self) -> &mut SourceCollector {
        self.collector
    }
}

impl Drop for WidenedCollector<'_> {
    fn drop(&mut self) {
        if let Some(extension) = self.added.take() {
            self.collector.extensions.remove(&extension);
            tracing::debug!("collector: restored extension set without .{}", extension);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DriverTree;

    #[test]
    fn test_collects_known_extensions_recursively() {
        let tree = DriverTree::new()
            .file("wmbus_common.cpp")
            .file("wmbus_common.h")
            .file("util/crc.c")
            .file("README.md")
            .enabled("izar");

        let files = SourceCollector::new().collect(tree.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"crc.c".to_string()));
        assert!(!names.contains(&"driver_izar.cc".to_string()));
    }

    #[test]
    fn test_widened_restores_extension_set() {
        let tree = DriverTree::new().file("wmbus_common.cpp").enabled("izar");
        let mut collector = SourceCollector::new();
        let before = collector.clone();

        {
            let widened = collector.widened(".cc");
            let files = widened.collect(tree.path()).unwrap();
            assert_eq!(files.len(), 2);
        }

        assert_eq!(collector, before);
        assert_eq!(collector.collect(tree.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_widened_keeps_existing_extension() {
        let mut collector = SourceCollector::with_extensions(["cc"]);

        drop(collector.widened("cc"));

        assert!(collector.recognizes(Path::new("driver_izar.cc")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tree = DriverTree::new();
        assert!(SourceCollector::new()
            .collect(&tree.path().join("missing"))
            .is_err());
    }
}
