//! Test utilities for driver-gate unit tests.
//!
//! `DriverTree` builds a throwaway component source directory with enabled
//! and disabled driver files, and can snapshot it for before/after checks.
//!
//! # Example
//!
//! ```rust,ignore
//! use driver_gate::test_support::DriverTree;
//!
//! let tree = DriverTree::new().enabled("izar").disabled("amiplus");
//! assert_eq!(tree.file_names(), ["driver_amiplus.cc.off", "driver_izar.cc"]);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::core::{DriverId, DriverLayout};

/// A temporary component source directory.
#[derive(Debug)]
pub struct DriverTree {
    dir: TempDir,
    layout: DriverLayout,
}

impl DriverTree {
    /// Create an empty tree using the default layout.
    pub fn new() -> Self {
        Self::with_layout(DriverLayout::default())
    }

    /// Create an empty tree using a specific layout.
    pub fn with_layout(layout: DriverLayout) -> Self {
        DriverTree {
            dir: TempDir::new().expect("failed to create temp dir"),
            layout,
        }
    }

    /// Add an enabled driver source.
    pub fn enabled(self, id: &str) -> Self {
        let name = self.layout.canonical_file_name(&driver(id));
        self.write(&name, &source_body(id))
    }

    /// Add a disabled driver source.
    pub fn disabled(self, id: &str) -> Self {
        let name = self.layout.disabled_file_name(&driver(id));
        self.write(&name, &source_body(id))
    }

    /// Add an arbitrary file (path relative to the tree root).
    pub fn file(self, rel: &str) -> Self {
        self.write(rel, "// not a driver\n")
    }

    fn write(self, rel: &str, contents: &str) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> &DriverLayout {
        &self.layout
    }

    /// Sorted names of the files directly under the root.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("failed to read fixture dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every file in the tree with its contents.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(self.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(self.path()).unwrap().to_path_buf();
                let contents = fs::read(e.path()).unwrap();
                (rel, contents)
            })
            .collect()
    }
}

impl Default for DriverTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a valid driver id in tests.
pub fn driver(id: &str) -> DriverId {
    DriverId::new(id).expect("invalid driver id in test")
}

fn source_body(id: &str) -> String {
    format!("// decoder for {id}\nstatic const char *DRIVER = \"{id}\";\n")
}
