//! Driver registry - the legal vocabulary of driver identifiers.
//!
//! The registry is derived from file names in the component's source
//! directory, once per configuration pass, before any user input is checked.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::core::driver_id::DriverId;
use crate::core::errors::GateError;
use crate::core::layout::{DriverLayout, SourceFileState};
use crate::util::fs::glob_files;

/// Every driver present in a source tree, with its current file state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverRegistry {
    drivers: BTreeMap<DriverId, SourceFileState>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        DriverRegistry {
            drivers: BTreeMap::new(),
        }
    }

    /// Build a registry from known ids, all enabled.
    pub fn from_ids(ids: impl IntoIterator<Item = DriverId>) -> Self {
        DriverRegistry {
            drivers: ids
                .into_iter()
                .map(|id| (id, SourceFileState::Enabled))
                .collect(),
        }
    }

    /// Record a driver. An enabled copy wins over a disabled one.
    pub fn insert(&mut self, id: DriverId, state: SourceFileState) {
        match self.drivers.entry(id) {
            btree_map::Entry::Vacant(e) => {
                e.insert(state);
            }
            btree_map::Entry::Occupied(mut e) => {
                if state == SourceFileState::Enabled {
                    e.insert(state);
                }
            }
        }
    }

    pub fn contains(&self, id: &DriverId) -> bool {
        self.drivers.contains_key(id)
    }

    /// Current on-disk state of a driver.
    pub fn state(&self, id: &DriverId) -> Option<SourceFileState> {
        self.drivers.get(id).copied()
    }

    /// Driver identifiers in lexical order.
    pub fn ids(&self) -> impl Iterator<Item = &DriverId> {
        self.drivers.keys()
    }

    /// Drivers with their state, in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&DriverId, SourceFileState)> {
        self.drivers.iter().map(|(id, state)| (id, *state))
    }

    /// Identifiers as plain strings, for messages.
    pub fn names(&self) -> Vec<String> {
        self.drivers.keys().map(|id| id.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// Enumerate the drivers available in `source_dir`.
///
/// Only the top level of the directory is scanned. Both enabled
/// (`driver_<id>.cc`) and disabled (`driver_<id>.cc.off`) files count, so the
/// vocabulary does not shrink after a filtered build.
pub fn discover(source_dir: &Path, layout: &DriverLayout) -> Result<DriverRegistry> {
    if !source_dir.is_dir() {
        return Err(GateError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        }
        .into());
    }

    let files = glob_files(source_dir, &[layout.enabled_glob(), layout.disabled_glob()])?;

    let mut registry = DriverRegistry::new();
    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("ignoring driver file with non-UTF-8 name: {}", path.display());
            continue;
        };

        match layout.parse_file_name(file_name) {
            Some((id, state)) => {
                if let Some(existing) = registry.state(&id) {
                    if existing != state {
                        tracing::warn!(
                            "both {} and {} exist; treating `{}` as enabled",
                            layout.canonical_file_name(&id),
                            layout.disabled_file_name(&id),
                            id
                        );
                    }
                }
                registry.insert(id, state);
            }
            None => {
                tracing::warn!("ignoring driver-like file with invalid name: {}", file_name);
            }
        }
    }

    tracing::debug!(
        "discovered {} drivers in {}",
        registry.len(),
        source_dir.display()
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DriverTree;

    fn id(s: &str) -> DriverId {
        DriverId::new(s).unwrap()
    }

    #[test]
    fn test_discover_enabled_and_disabled() {
        let tree = DriverTree::new()
            .enabled("amiplus")
            .disabled("izar")
            .file("wmbus_common.cc")
            .file("driver_notes.txt");

        let registry = discover(tree.path(), &DriverLayout::default()).unwrap();

        assert_eq!(registry.names(), ["amiplus", "izar"]);
        assert_eq!(
            registry.state(&id("amiplus")),
            Some(SourceFileState::Enabled)
        );
        assert_eq!(registry.state(&id("izar")), Some(SourceFileState::Disabled));
    }

    #[test]
    fn test_discover_duplicate_copies_count_once() {
        let tree = DriverTree::new().enabled("izar").disabled("izar");

        let registry = discover(tree.path(), &DriverLayout::default()).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.state(&id("izar")), Some(SourceFileState::Enabled));
    }

    #[test]
    fn test_discover_skips_invalid_names() {
        let tree = DriverTree::new().enabled("amiplus").file("driver_Bad Name.cc");

        let registry = discover(tree.path(), &DriverLayout::default()).unwrap();

        assert_eq!(registry.names(), ["amiplus"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let tree = DriverTree::new();
        let missing = tree.path().join("nope");

        let err = discover(&missing, &DriverLayout::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::SourceDirNotFound { .. })
        ));
    }

    #[test]
    fn test_discover_is_deterministic() {
        let tree = DriverTree::new().enabled("b").enabled("a").disabled("c");
        let layout = DriverLayout::default();

        let first = discover(tree.path(), &layout).unwrap();
        let second = discover(tree.path(), &layout).unwrap();
        assert_eq!(first, second);
    }
}
