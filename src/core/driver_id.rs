//! Driver identifiers.
//!
//! A `DriverId` names one optional decoder module. Identifiers are derived
//! from file names on disk and from user configuration; both go through the
//! same normalization so `"Apator 162"`, `"apator-162"` and `"apator_162"`
//! compare equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::errors::GateError;

/// A case-normalized, underscore-separated driver identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverId(String);

impl DriverId {
    /// Normalize and validate a raw identifier.
    pub fn new(raw: &str) -> Result<Self, GateError> {
        let normalized = normalize(raw);

        if normalized.is_empty() {
            return Err(GateError::InvalidDriverId {
                raw: raw.to_string(),
                reason: "identifier is empty".to_string(),
            });
        }

        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(GateError::InvalidDriverId {
                raw: raw.to_string(),
                reason: format!("unexpected character `{}`", c),
            });
        }

        Ok(DriverId(normalized))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lowercase, trim, and map spaces and dashes to underscores.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DriverId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverId::new(s)
    }
}

impl AsRef<str> for DriverId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for DriverId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DriverId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DriverId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let id = DriverId::new("  Apator 162 ").unwrap();
        assert_eq!(id.as_str(), "apator_162");

        let id: DriverId = "Multical-21".parse().unwrap();
        assert_eq!(id.as_str(), "multical_21");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            DriverId::new("   "),
            Err(GateError::InvalidDriverId { .. })
        ));
    }

    #[test]
    fn test_rejects_path_characters() {
        let err = DriverId::new("../evil").unwrap_err();
        assert!(err.to_string().contains("../evil"));
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut ids = vec![
            DriverId::new("izar").unwrap(),
            DriverId::new("amiplus").unwrap(),
            DriverId::new("apator162").unwrap(),
        ];
        ids.sort();
        let names: Vec<_> = ids.iter().map(DriverId::as_str).collect();
        assert_eq!(names, ["amiplus", "apator162", "izar"]);
    }
}
