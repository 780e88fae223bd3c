//! The build environment record.
//!
//! This is the only thing that crosses from the configuration phase to the
//! filtering phase: a comma-joined, lexically sorted list of driver ids.
//! An empty record means "no restriction", never "disable everything".

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::driver_id::DriverId;
use crate::core::errors::GateError;
use crate::core::selection::Selection;

/// Serialized driver selection passed between build phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildEnvironmentRecord {
    drivers: BTreeSet<DriverId>,
}

impl BuildEnvironmentRecord {
    /// A record placing no restriction on the build.
    pub fn unrestricted() -> Self {
        BuildEnvironmentRecord::default()
    }

    /// Parse a record value.
    ///
    /// Accepts the raw list as well as a value still wrapped in one layer of
    /// quotes, which is how it comes back out of a `NAME="a,b"` define.
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        let value = raw.trim().trim_matches('"').trim_matches('\'');

        let drivers = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(DriverId::new)
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(BuildEnvironmentRecord { drivers })
    }

    /// True when no driver is named; filtering must leave the tree alone.
    pub fn is_unrestricted(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn contains(&self, id: &DriverId) -> bool {
        self.drivers.contains(id)
    }

    pub fn drivers(&self) -> &BTreeSet<DriverId> {
        &self.drivers
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl From<&Selection> for BuildEnvironmentRecord {
    fn from(selection: &Selection) -> Self {
        BuildEnvironmentRecord {
            drivers: selection.iter().cloned().collect(),
        }
    }
}

impl FromIterator<DriverId> for BuildEnvironmentRecord {
    fn from_iter<I: IntoIterator<Item = DriverId>>(iter: I) -> Self {
        BuildEnvironmentRecord {
            drivers: iter.into_iter().collect(),
        }
    }
}

impl FromStr for BuildEnvironmentRecord {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildEnvironmentRecord::parse(s)
    }
}

impl fmt::Display for BuildEnvironmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.drivers {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(id.as_str())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sorted() {
        let record: BuildEnvironmentRecord = ["izar", "amiplus", "apator162"]
            .iter()
            .map(|n| DriverId::new(n).unwrap())
            .collect();
        assert_eq!(record.to_string(), "amiplus,apator162,izar");
    }

    #[test]
    fn test_parse_tolerates_quotes_and_whitespace() {
        let record = BuildEnvironmentRecord::parse(" \"izar, amiplus,,\" ").unwrap();
        assert_eq!(record.to_string(), "amiplus,izar");

        let record: BuildEnvironmentRecord = "'izar'".parse().unwrap();
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_empty_is_unrestricted() {
        assert!(BuildEnvironmentRecord::parse("").unwrap().is_unrestricted());
        assert!(BuildEnvironmentRecord::parse(" , ").unwrap().is_unrestricted());
        assert!(BuildEnvironmentRecord::parse("\"\"").unwrap().is_unrestricted());
        assert_eq!(BuildEnvironmentRecord::unrestricted().to_string(), "");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BuildEnvironmentRecord::parse("izar,../x").is_err());
    }
}
