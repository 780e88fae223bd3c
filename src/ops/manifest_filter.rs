//! Manifest-level resource filtering.
//!
//! Some hosts build from a discovered resource list rather than from the
//! directory contents. This narrows such a list the same way the filesystem
//! filter narrows the tree, without touching any file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::driver_id::DriverId;
use crate::core::layout::{DriverLayout, SourceFileState};
use crate::core::record::BuildEnvironmentRecord;
use crate::core::registry::DriverRegistry;

/// Include/exclude filter over driver resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Drivers allowed through; `None` lets every driver through.
    pub include: Option<BTreeSet<DriverId>>,
    /// Drivers always dropped
    pub exclude: BTreeSet<DriverId>,
    pub layout: DriverLayout,
}

impl ResourceFilter {
    /// A filter that passes everything.
    pub fn unrestricted(layout: DriverLayout) -> Self {
        ResourceFilter {
            include: None,
            exclude: BTreeSet::new(),
            layout,
        }
    }

    /// Build the filter for a propagated record.
    ///
    /// An empty record yields an unrestricted filter, matching the filesystem
    /// filter which leaves the tree alone in that case.
    pub fn from_record(
        record: &BuildEnvironmentRecord,
        registry: &DriverRegistry,
        layout: DriverLayout,
    ) -> Self {
        if record.is_unrestricted() {
            return Self::unrestricted(layout);
        }

        let include = record.drivers().clone();
        let exclude = registry
            .ids()
            .filter(|id| !include.contains(*id))
            .cloned()
            .collect();

        ResourceFilter {
            include: Some(include),
            exclude,
            layout,
        }
    }

    /// Whether a single resource survives the filter.
    ///
    /// Only enabled driver sources are subject to the filter. A disabled copy
    /// is never a compile input, and anything else is not a driver.
    pub fn allows(&self, resource: &Path) -> bool {
        let Some(name) = resource.file_name().and_then(|n| n.to_str()) else {
            return true;
        };

        match self.layout.parse_file_name(name) {
            Some((id, SourceFileState::Enabled)) => {
                let included = self.include.as_ref().map_or(true, |set| set.contains(&id));
                included && !self.exclude.contains(&id)
            }
            _ => true,
        }
    }

    /// Narrow a resource list, preserving order.
    pub fn filter(&self, resources: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
        resources
            .into_iter()
            .filter(|path| {
                let keep = self.allows(path);
                if !keep {
                    tracing::debug!("manifest: dropping {}", path.display());
                }
                keep
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::discover;
    use crate::ops::filter::filter_drivers;
    use crate::sources::{ResourceSource, SourceCollector};
    use crate::test_support::{driver, DriverTree};

    fn record(names: &[&str]) -> BuildEnvironmentRecord {
        names.iter().map(|n| driver(n)).collect()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_non_driver_resources_pass() {
        let registry = DriverRegistry::from_ids([driver("a"), driver("b")]);
        let filter =
            ResourceFilter::from_record(&record(&["a"]), &registry, DriverLayout::default());

        let out = filter.filter(vec![
            PathBuf::from("src/wmbus_common.cpp"),
            PathBuf::from("src/driver_a.cc"),
            PathBuf::from("src/driver_b.cc"),
            PathBuf::from("src/driver_b.h"),
        ]);

        assert_eq!(
            names(&out),
            ["wmbus_common.cpp", "driver_a.cc", "driver_b.h"]
        );
    }

    #[test]
    fn test_empty_record_is_unrestricted() {
        let registry = DriverRegistry::from_ids([driver("a"), driver("b")]);
        let filter = ResourceFilter::from_record(
            &BuildEnvironmentRecord::unrestricted(),
            &registry,
            DriverLayout::default(),
        );

        assert_eq!(filter.include, None);
        assert!(filter.exclude.is_empty());
        assert!(filter.allows(Path::new("driver_a.cc")));
        assert!(filter.allows(Path::new("driver_b.cc")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = ResourceFilter {
            include: Some([driver("a")].into_iter().collect()),
            exclude: [driver("a")].into_iter().collect(),
            layout: DriverLayout::default(),
        };

        assert!(!filter.allows(Path::new("driver_a.cc")));
    }

    #[test]
    fn test_agrees_with_filesystem_filter() {
        let tree = DriverTree::new()
            .enabled("amiplus")
            .enabled("izar")
            .disabled("apator162")
            .file("wmbus_common.cpp")
            .file("driver_Izar.cc")
            .file("driver_.cc");
        let rec = record(&["izar", "apator162"]);

        let registry = discover(tree.path(), tree.layout()).unwrap();
        let manifest = ResourceFilter::from_record(&rec, &registry, tree.layout().clone());

        let mut collector = SourceCollector::new();
        let before = collector.widened(&tree.layout().extension).collect(tree.path()).unwrap();
        let from_manifest = names(&manifest.filter(before));

        filter_drivers(tree.path(), &rec, tree.layout()).unwrap();
        let after = collector.widened(&tree.layout().extension).collect(tree.path()).unwrap();
        let on_disk: BTreeSet<String> = names(&after).into_iter().collect();

        // Every resource the manifest filter keeps is still there afterwards.
        for name in &from_manifest {
            assert!(on_disk.contains(name), "{name} missing on disk");
        }
        for name in ["driver_Izar.cc", "driver_.cc"] {
            assert!(from_manifest.contains(&name.to_string()));
            assert!(on_disk.contains(name));
        }
        assert!(!from_manifest.contains(&"driver_amiplus.cc".to_string()));
        assert!(!on_disk.contains("driver_amiplus.cc"));
        assert!(on_disk.contains("driver_apator162.cc"));
    }
}
