//! Selection validation.
//!
//! Turns the user's `drivers` value into a normalized set of identifiers,
//! checked against the registry. The validator returns the selection to its
//! caller; nothing is accumulated behind the caller's back, so two
//! configuration passes in one process can never see each other's drivers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::driver_id::DriverId;
use crate::core::errors::GateError;
use crate::core::registry::DriverRegistry;

/// Sentinel selecting every registered driver.
pub const ALL: &str = "all";

/// Per-instance sentinel deferring the driver choice to runtime.
pub const AUTO: &str = "auto";

/// Raw selection value as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionInput {
    /// `"all"` or a single identifier.
    One(String),
    /// A list of identifiers.
    Many(Vec<String>),
}

impl Default for SelectionInput {
    fn default() -> Self {
        SelectionInput::Many(Vec::new())
    }
}

impl SelectionInput {
    /// Parse a command-line value: `all`, or comma-separated identifiers.
    pub fn from_cli(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(ALL) {
            SelectionInput::One(ALL.to_string())
        } else {
            SelectionInput::Many(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        }
    }
}

/// Validation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Accept a single identifier without a surrounding list.
    pub permissive: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions { permissive: true }
    }
}

/// The resolved set of drivers to compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    drivers: BTreeSet<DriverId>,
}

impl Selection {
    pub fn new() -> Self {
        Selection {
            drivers: BTreeSet::new(),
        }
    }

    pub fn contains(&self, id: &DriverId) -> bool {
        self.drivers.contains(id)
    }

    /// Add a driver. Adding the same driver twice is a no-op.
    pub fn insert(&mut self, id: DriverId) -> bool {
        self.drivers.insert(id)
    }

    /// Merge another selection into this one.
    pub fn extend(&mut self, other: Selection) {
        self.drivers.extend(other.drivers);
    }

    /// Drivers in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &DriverId> {
        self.drivers.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.drivers.iter().map(|id| id.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Check that every selected driver is in the registry.
    ///
    /// Validation already guarantees this, so a failure here is a defect.
    pub fn ensure_within(&self, registry: &DriverRegistry) -> Result<(), GateError> {
        let strays: Vec<String> = self
            .drivers
            .iter()
            .filter(|id| !registry.contains(id))
            .map(|id| id.to_string())
            .collect();

        if strays.is_empty() {
            Ok(())
        } else {
            Err(GateError::InvariantViolation { drivers: strays })
        }
    }
}

impl FromIterator<DriverId> for Selection {
    fn from_iter<I: IntoIterator<Item = DriverId>>(iter: I) -> Self {
        Selection {
            drivers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Driver choice for a single configured instance (e.g. one meter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverChoice {
    /// Pick the driver at runtime from incoming data.
    Auto,
    /// A specific registered driver.
    Driver(DriverId),
}

impl DriverChoice {
    /// The concrete driver, if one was chosen at build time.
    pub fn driver(&self) -> Option<&DriverId> {
        match self {
            DriverChoice::Auto => None,
            DriverChoice::Driver(id) => Some(id),
        }
    }
}

impl Serialize for DriverChoice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for DriverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverChoice::Auto => f.write_str(AUTO),
            DriverChoice::Driver(id) => write!(f, "{}", id),
        }
    }
}

/// Validate the global driver selection against the registry.
pub fn validate(
    raw: &SelectionInput,
    registry: &DriverRegistry,
    opts: ValidateOptions,
) -> Result<Selection, GateError> {
    match raw {
        SelectionInput::One(value) if value.trim().eq_ignore_ascii_case(ALL) => {
            Ok(registry.ids().cloned().collect())
        }
        SelectionInput::One(value) => {
            if !opts.permissive {
                return Err(GateError::ScalarSelection {
                    value: value.clone(),
                });
            }
            let id = validate_driver(value, registry)?;
            Ok(std::iter::once(id).collect())
        }
        SelectionInput::Many(values) => values
            .iter()
            .map(|value| validate_driver(value, registry))
            .collect(),
    }
}

/// Validate a per-instance driver choice; `auto` is passed through untouched.
pub fn validate_choice(raw: &str, registry: &DriverRegistry) -> Result<DriverChoice, GateError> {
    if raw.trim().eq_ignore_ascii_case(AUTO) {
        return Ok(DriverChoice::Auto);
    }
    validate_driver(raw, registry).map(DriverChoice::Driver)
}

/// Normalize one identifier and check it is registered.
pub fn validate_driver(raw: &str, registry: &DriverRegistry) -> Result<DriverId, GateError> {
    let unknown = || GateError::UnknownDriver {
        name: raw.trim().to_string(),
        allowed: registry.names(),
    };

    let id = DriverId::new(raw).map_err(|_| unknown())?;
    if registry.contains(&id) {
        Ok(id)
    } else {
        Err(unknown())
    }
}
