//! Configuration file support for driver-gate.
//!
//! Two configuration file locations are read:
//! - Global: `~/.driver-gate/config.toml` - User-wide defaults
//! - Project: `driver-gate.toml` - found by walking up from the working directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::layout::DriverLayout;
use crate::core::selection::{SelectionInput, ValidateOptions};
use crate::util::diagnostic::ConfigParseError;

/// Project config file name.
pub const CONFIG_FILE_NAME: &str = "driver-gate.toml";

/// Default location of the build environment file, relative to the project root.
pub const DEFAULT_ENV_FILE: &str = ".driver-gate/build_env.toml";

/// Default name of the compiler-visible define.
pub const DEFAULT_DEFINE: &str = "ESPHOME_WMBUS_INCLUDE_DRIVERS";

/// Default build-tool option key.
pub const DEFAULT_OPTION: &str = "include_drivers";

/// driver-gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the component and its build environment live
    pub component: ComponentConfig,

    /// Driver file naming convention
    pub layout: Option<DriverLayout>,

    /// Global driver selection
    pub drivers: DriversConfig,

    /// Per-instance driver choices
    #[serde(rename = "instance")]
    pub instances: Vec<InstanceConfig>,

    /// Names used when propagating the selection
    pub propagate: PropagateConfig,
}

/// Component location settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Directory holding the driver sources
    pub source_dir: Option<PathBuf>,

    /// Build environment file shared with the later build phase
    pub env_file: Option<PathBuf>,
}

/// Global selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriversConfig {
    /// `"all"`, a single driver, or a list of drivers
    pub select: Option<SelectionInput>,

    /// Accept a single driver without a surrounding list
    pub permissive: bool,
}

impl Default for DriversConfig {
    fn default() -> Self {
        DriversConfig {
            select: None,
            permissive: true,
        }
    }
}

/// A configured instance that names its own driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Instance name, for messages
    pub name: String,

    /// Driver identifier, or `auto`
    pub driver: String,
}

/// Propagation key names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagateConfig {
    /// Name of the compiler-visible define
    pub define: Option<String>,

    /// Name of the build-tool option
    pub option: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::parse(path, &contents)
    }

    /// Parse configuration text, reporting errors with their source span.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigParseError::from_toml(path, contents, &e).into())
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.component.source_dir.is_some() {
            self.component.source_dir = other.component.source_dir;
        }
        if other.component.env_file.is_some() {
            self.component.env_file = other.component.env_file;
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.drivers.select.is_some() {
            self.drivers.select = other.drivers.select;
        }
        // `permissive` defaults to true, so only a stricter setting overrides.
        if !other.drivers.permissive {
            self.drivers.permissive = false;
        }
        if !other.instances.is_empty() {
            self.instances = other.instances;
        }
        if other.propagate.define.is_some() {
            self.propagate.define = other.propagate.define;
        }
        if other.propagate.option.is_some() {
            self.propagate.option = other.propagate.option;
        }
    }

    /// Effective file naming convention.
    pub fn layout(&self) -> DriverLayout {
        self.layout.clone().unwrap_or_default()
    }

    /// Effective validation options.
    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            permissive: self.drivers.permissive,
        }
    }

    /// Effective define name.
    pub fn define_name(&self) -> &str {
        self.propagate.define.as_deref().unwrap_or(DEFAULT_DEFINE)
    }

    /// Effective build-tool option key.
    pub fn option_key(&self) -> &str {
        self.propagate.option.as_deref().unwrap_or(DEFAULT_OPTION)
    }
}

/// Load merged configuration from global and project locations.
///
/// A global config that fails to parse is logged and ignored; a broken
/// project config is an error, since it holds the selection.
pub fn load_config(global_path: Option<&Path>, project_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        match Config::load(global_path) {
            Ok(global) => config.merge(global),
            Err(e) => {
                tracing::warn!(
                    "Failed to load config from {}: {}",
                    global_path.display(),
                    e
                );
            }
        }
    }

    if let Some(project_path) = project_path {
        config.merge(Config::load(project_path)?);
    }

    Ok(config)
}

/// Get the global config directory (~/.driver-gate).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".driver-gate"))
}

/// Get the global config path (~/.driver-gate/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.drivers.select.is_none());
        assert!(config.drivers.permissive);
        assert_eq!(config.layout(), DriverLayout::default());
        assert_eq!(config.define_name(), "ESPHOME_WMBUS_INCLUDE_DRIVERS");
        assert_eq!(config.option_key(), "include_drivers");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[component]
source_dir = "components/wmbus_common"

[layout]
extension = "cpp"

[drivers]
select = ["amiplus", "izar"]
permissive = false

[[instance]]
name = "water"
driver = "auto"

[[instance]]
name = "heat"
driver = "multical21"

[propagate]
option = "custom_drivers"
"#;

        let config = Config::parse(Path::new("driver-gate.toml"), toml).unwrap();
        assert_eq!(
            config.component.source_dir,
            Some(PathBuf::from("components/wmbus_common"))
        );
        assert_eq!(config.layout().extension, "cpp");
        assert_eq!(config.layout().prefix, "driver_");
        assert_eq!(
            config.drivers.select,
            Some(SelectionInput::Many(vec![
                "amiplus".to_string(),
                "izar".to_string()
            ]))
        );
        assert!(!config.validate_options().permissive);
        assert_eq!(config.instances.len(), 2);
        assert_eq!(config.instances[0].driver, "auto");
        assert_eq!(config.option_key(), "custom_drivers");
        assert_eq!(config.define_name(), DEFAULT_DEFINE);
    }

    #[test]
    fn test_parse_error_is_reported_with_span() {
        let err = Config::parse(Path::new("driver-gate.toml"), "[drivers]\nselect = 3\n")
            .unwrap_err();
        let parse_err = err.downcast_ref::<ConfigParseError>().unwrap();
        assert!(parse_err.span.is_some());
    }

    #[test]
    fn test_merge_project_over_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("driver-gate.toml");

        std::fs::write(
            &global,
            "[drivers]\nselect = \"all\"\n[component]\nenv_file = \"/tmp/env.toml\"\n",
        )
        .unwrap();
        std::fs::write(&project, "[drivers]\nselect = [\"izar\"]\n").unwrap();

        let config = load_config(Some(&global), Some(&project)).unwrap();
        assert_eq!(
            config.drivers.select,
            Some(SelectionInput::Many(vec!["izar".to_string()]))
        );
        assert_eq!(config.component.env_file, Some(PathBuf::from("/tmp/env.toml")));
    }

    #[test]
    fn test_broken_global_config_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        std::fs::write(&global, "not toml [").unwrap();

        let config = load_config(Some(&global), None).unwrap();
        assert!(config.drivers.select.is_none());
    }
}
