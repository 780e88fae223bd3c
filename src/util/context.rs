//! Global context for driver-gate operations.
//!
//! Provides centralized access to the working directory, the project
//! config location, and path resolution relative to the project root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config, CONFIG_FILE_NAME, DEFAULT_ENV_FILE};
use crate::util::fs::find_upwards;

/// Global context containing paths and the loaded configuration.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Project config file, if one was found
    config_path: Option<PathBuf>,

    /// Whether to read the user-wide config
    use_global_config: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let config_path = find_upwards(&cwd, CONFIG_FILE_NAME);

        Ok(GlobalContext {
            cwd,
            config_path,
            use_global_config: true,
        })
    }

    /// Use an explicit project config file instead of searching for one.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(self.resolve_from_cwd(&path));
        self
    }

    /// Skip the user-wide config (used by tests and `--no-global-config`).
    pub fn without_global_config(mut self) -> Self {
        self.use_global_config = false;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Project config file, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Project root: the directory holding the config, or the working directory.
    pub fn project_root(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(self.cwd.as_path())
    }

    /// Load the merged global + project configuration.
    pub fn load_config(&self) -> Result<Config> {
        let global = if self.use_global_config {
            config::global_config_path()
        } else {
            None
        };

        config::load_config(global.as_deref(), self.config_path.as_deref())
    }

    /// Resolve a path from the command line against the working directory.
    pub fn resolve_from_cwd(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Resolve a path from the config file against the project root.
    pub fn resolve_from_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root().join(path)
        }
    }

    /// Effective build environment file.
    ///
    /// Command-line value first, then config, then the default location
    /// under the project root.
    pub fn env_file(&self, cli: Option<&Path>, config: &Config) -> PathBuf {
        match (cli, config.component.env_file.as_deref()) {
            (Some(path), _) => self.resolve_from_cwd(path),
            (None, Some(path)) => self.resolve_from_root(path),
            (None, None) => self.project_root().join(DEFAULT_ENV_FILE),
        }
    }

    /// Effective driver source directory, if one is configured.
    pub fn source_dir(&self, cli: Option<&Path>, config: &Config) -> Option<PathBuf> {
        match (cli, config.component.source_dir.as_deref()) {
            (Some(path), _) => Some(self.resolve_from_cwd(path)),
            (None, Some(path)) => Some(self.resolve_from_root(path)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_root_follows_config() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("build").join("esp32");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[component]\nsource_dir = \"components/wmbus_common\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(sub.clone())
            .unwrap()
            .without_global_config();
        assert_eq!(ctx.project_root(), tmp.path());

        let config = ctx.load_config().unwrap();
        assert_eq!(
            ctx.source_dir(None, &config),
            Some(tmp.path().join("components/wmbus_common"))
        );
        assert_eq!(
            ctx.source_dir(Some(Path::new("other")), &config),
            Some(sub.join("other"))
        );
        assert_eq!(
            ctx.env_file(None, &config),
            tmp.path().join(".driver-gate/build_env.toml")
        );
    }

    #[test]
    fn test_without_config_uses_cwd() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .unwrap()
            .without_global_config();

        assert!(ctx.config_path().is_none());
        assert_eq!(ctx.project_root(), tmp.path());

        let config = ctx.load_config().unwrap();
        assert!(ctx.source_dir(None, &config).is_none());
    }
}
