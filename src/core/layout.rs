//! On-disk naming convention for driver sources.
//!
//! A driver lives in `<prefix><id>.<extension>`. When it is excluded from a
//! build the file is renamed to `<prefix><id>.<extension>.<disabled_suffix>`;
//! the suffix is the only record of whether a driver is currently enabled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::driver_id::DriverId;

/// Whether a driver source file is visible to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFileState {
    /// File present under its canonical name.
    Enabled,
    /// File renamed with the disabled suffix.
    Disabled,
}

impl fmt::Display for SourceFileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFileState::Enabled => write!(f, "enabled"),
            SourceFileState::Disabled => write!(f, "disabled"),
        }
    }
}

/// File naming convention for driver sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverLayout {
    /// Literal file name prefix (e.g. `driver_`)
    pub prefix: String,

    /// Source extension without the leading dot (e.g. `cc`)
    pub extension: String,

    /// Suffix appended to disabled files, without the leading dot (e.g. `off`)
    pub disabled_suffix: String,
}

impl Default for DriverLayout {
    fn default() -> Self {
        DriverLayout {
            prefix: "driver_".to_string(),
            extension: "cc".to_string(),
            disabled_suffix: "off".to_string(),
        }
    }
}

impl DriverLayout {
    /// `driver_<id>.cc`
    pub fn canonical_file_name(&self, id: &DriverId) -> String {
        format!("{}{}.{}", self.prefix, id, self.extension)
    }

    /// `driver_<id>.cc.off`
    pub fn disabled_file_name(&self, id: &DriverId) -> String {
        format!("{}.{}", self.canonical_file_name(id), self.disabled_suffix)
    }

    /// Strip the disabled suffix from a file name, if present.
    pub fn strip_disabled_suffix<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_suffix(self.disabled_suffix.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
    }

    /// Glob pattern matching enabled driver files.
    pub fn enabled_glob(&self) -> String {
        format!(
            "{}*.{}",
            glob::Pattern::escape(&self.prefix),
            glob::Pattern::escape(&self.extension)
        )
    }

    /// Glob pattern matching disabled driver files.
    pub fn disabled_glob(&self) -> String {
        format!(
            "{}.{}",
            self.enabled_glob(),
            glob::Pattern::escape(&self.disabled_suffix)
        )
    }

    /// Extract the driver identifier and state from a file name.
    ///
    /// Returns `None` for anything that does not follow the convention or
    /// whose identifier part is not a valid `DriverId`.
    pub fn parse_file_name(&self, file_name: &str) -> Option<(DriverId, SourceFileState)> {
        let (base, state) = match self.strip_disabled_suffix(file_name) {
            Some(base) => (base, SourceFileState::Disabled),
            None => (file_name, SourceFileState::Enabled),
        };

        let stem = base
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        let id = DriverId::new(stem).ok()?;

        // Reject names that only match after normalization (`driver_Izar.cc`),
        // since renaming them would not round-trip to the canonical name.
        if id.as_str() != stem {
            return None;
        }

        Some((id, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DriverId {
        DriverId::new(s).unwrap()
    }

    #[test]
    fn test_file_names() {
        let layout = DriverLayout::default();
        assert_eq!(layout.canonical_file_name(&id("izar")), "driver_izar.cc");
        assert_eq!(layout.disabled_file_name(&id("izar")), "driver_izar.cc.off");
    }

    #[test]
    fn test_parse_file_name() {
        let layout = DriverLayout::default();

        assert_eq!(
            layout.parse_file_name("driver_izar.cc"),
            Some((id("izar"), SourceFileState::Enabled))
        );
        assert_eq!(
            layout.parse_file_name("driver_apator162.cc.off"),
            Some((id("apator162"), SourceFileState::Disabled))
        );

        assert_eq!(layout.parse_file_name("driver_.cc"), None);
        assert_eq!(layout.parse_file_name("driver_izar.h"), None);
        assert_eq!(layout.parse_file_name("meters.cc"), None);
        assert_eq!(layout.parse_file_name("driver_izar.cc.bak"), None);
        assert_eq!(layout.parse_file_name("driver_Izar.cc"), None);
    }

    #[test]
    fn test_custom_layout() {
        let layout = DriverLayout {
            prefix: "decoder-".to_string(),
            extension: "cpp".to_string(),
            disabled_suffix: "disabled".to_string(),
        };

        assert_eq!(
            layout.parse_file_name("decoder-kamstrup.cpp.disabled"),
            Some((id("kamstrup"), SourceFileState::Disabled))
        );
        assert_eq!(
            layout.parse_file_name("decoder-kamstrup.cpp"),
            Some((id("kamstrup"), SourceFileState::Enabled))
        );
        assert_eq!(layout.enabled_glob(), "decoder-*.cpp");
        assert_eq!(layout.disabled_glob(), "decoder-*.cpp.disabled");
    }

    #[test]
    fn test_globs_escape_configured_parts() {
        let layout = DriverLayout {
            prefix: "drv[x]_".to_string(),
            extension: "c*".to_string(),
            disabled_suffix: "off?".to_string(),
        };

        assert_eq!(layout.enabled_glob(), "drv[[]x[]]_*.c[*]");
        assert_eq!(layout.disabled_glob(), "drv[[]x[]]_*.c[*].off[?]");

        let enabled = glob::Pattern::new(&layout.enabled_glob()).unwrap();
        assert!(enabled.matches("drv[x]_izar.c*"));
        assert!(!enabled.matches("drv[x]_izar.cc"));

        let disabled = glob::Pattern::new(&layout.disabled_glob()).unwrap();
        assert!(disabled.matches("drv[x]_izar.c*.off?"));
        assert!(!disabled.matches("drv[x]_izar.c*.offx"));
    }
}
