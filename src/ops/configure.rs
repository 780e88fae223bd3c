//! Implementation of `driver-gate configure`.
//!
//! Discovery, validation and propagation in one pass. Every concrete driver
//! named by the global selection or by an instance ends up in the returned
//! selection; nothing is accumulated outside the call.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::layout::DriverLayout;
use crate::core::registry::{discover, DriverRegistry};
use crate::core::selection::{
    validate, validate_choice, DriverChoice, Selection, SelectionInput, ValidateOptions,
};
use crate::ops::build_env::BuildEnvironment;
use crate::ops::propagate::{propagate_to_file, Propagation, PropagationKeys};
use crate::util::config::{Config, InstanceConfig};

/// Options for a configure run.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Directory holding the driver sources
    pub source_dir: PathBuf,

    /// Build environment file to write
    pub env_file: PathBuf,

    /// Global selection; `None` selects nothing
    pub selection: Option<SelectionInput>,

    /// Per-instance driver choices
    pub instances: Vec<InstanceConfig>,

    pub validate: ValidateOptions,
    pub layout: DriverLayout,
    pub keys: PropagationKeys,
}

impl ConfigureOptions {
    /// Options taken from a loaded config; paths must already be resolved.
    pub fn from_config(config: &Config, source_dir: PathBuf, env_file: PathBuf) -> Self {
        ConfigureOptions {
            source_dir,
            env_file,
            selection: config.drivers.select.clone(),
            instances: config.instances.clone(),
            validate: config.validate_options(),
            layout: config.layout(),
            keys: PropagationKeys::from_config(config),
        }
    }
}

/// A validated per-instance choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceChoice {
    pub name: String,
    pub choice: DriverChoice,
}

/// Result of a configure run.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureResult {
    #[serde(skip)]
    pub registry: DriverRegistry,
    pub selection: Selection,
    pub instances: Vec<InstanceChoice>,
    pub propagation: Propagation,
    pub env_file: PathBuf,
}

/// Discover drivers, validate the selection and record it.
pub fn configure(opts: &ConfigureOptions) -> Result<ConfigureResult> {
    let registry = discover(&opts.source_dir, &opts.layout)?;

    let mut selection = match &opts.selection {
        Some(raw) => validate(raw, &registry, opts.validate)?,
        None => Selection::new(),
    };

    let mut instances = Vec::with_capacity(opts.instances.len());
    for instance in &opts.instances {
        let choice = validate_choice(&instance.driver, &registry)?;
        match &choice {
            DriverChoice::Driver(id) => {
                if selection.insert(id.clone()) {
                    tracing::debug!("instance `{}` adds driver `{}`", instance.name, id);
                }
            }
            DriverChoice::Auto => {
                tracing::debug!("instance `{}` uses auto detection", instance.name);
            }
        }
        instances.push(InstanceChoice {
            name: instance.name.clone(),
            choice,
        });
    }

    selection.ensure_within(&registry)?;

    tracing::info!(
        "selected {} of {} drivers: [{}]",
        selection.len(),
        registry.len(),
        selection
    );

    let mut env = BuildEnvironment::load(&opts.env_file)?;
    let propagation = propagate_to_file(&selection, &mut env, &opts.keys)?;

    Ok(ConfigureResult {
        registry,
        selection,
        instances,
        propagation,
        env_file: opts.env_file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::GateError;
    use crate::test_support::DriverTree;

    fn options(tree: &DriverTree, selection: Option<SelectionInput>) -> ConfigureOptions {
        ConfigureOptions {
            source_dir: tree.path().to_path_buf(),
            env_file: tree.path().join(".driver-gate").join("build_env.toml"),
            selection,
            instances: Vec::new(),
            validate: ValidateOptions::default(),
            layout: tree.layout().clone(),
            keys: PropagationKeys::default(),
        }
    }

    fn many(names: &[&str]) -> Option<SelectionInput> {
        Some(SelectionInput::Many(
            names.iter().map(|n| n.to_string()).collect(),
        ))
    }

    fn recorded(result: &ConfigureResult) -> String {
        let env = BuildEnvironment::load(&result.env_file).unwrap();
        env.option("include_drivers").unwrap_or_default()
    }

    #[test]
    fn test_all_selects_enabled_and_disabled_drivers() {
        let tree = DriverTree::new().enabled("izar").disabled("amiplus");
        let opts = options(&tree, Some(SelectionInput::One("ALL".to_string())));

        let result = configure(&opts).unwrap();

        assert_eq!(result.selection.names(), ["amiplus", "izar"]);
        assert_eq!(recorded(&result), "amiplus,izar");
    }

    #[test]
    fn test_instances_extend_selection() {
        let tree = DriverTree::new()
            .enabled("izar")
            .enabled("amiplus")
            .enabled("apator162");
        let mut opts = options(&tree, many(&["izar"]));
        opts.instances = vec![
            InstanceConfig {
                name: "water".to_string(),
                driver: "Apator162".to_string(),
            },
            InstanceConfig {
                name: "heat".to_string(),
                driver: "auto".to_string(),
            },
        ];

        let result = configure(&opts).unwrap();

        assert_eq!(result.selection.names(), ["apator162", "izar"]);
        assert_eq!(result.instances[1].choice, DriverChoice::Auto);
        assert_eq!(recorded(&result), "apator162,izar");
    }

    #[test]
    fn test_unknown_instance_driver_fails_before_writing() {
        let tree = DriverTree::new().enabled("izar");
        let mut opts = options(&tree, many(&["izar"]));
        opts.instances = vec![InstanceConfig {
            name: "water".to_string(),
            driver: "nope".to_string(),
        }];

        let err = configure(&opts).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::UnknownDriver { name, .. }) if name == "nope"
        ));
        assert!(!opts.env_file.exists());
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let tree = DriverTree::new();
        let mut opts = options(&tree, many(&["izar"]));
        opts.source_dir = tree.path().join("missing");

        let err = configure(&opts).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::SourceDirNotFound { .. })
        ));
    }

    #[test]
    fn test_no_selection_clears_previous_record() {
        let tree = DriverTree::new().enabled("izar");

        configure(&options(&tree, many(&["izar"]))).unwrap();
        let result = configure(&options(&tree, None)).unwrap();

        assert!(result.selection.is_empty());
        assert_eq!(
            result.propagation,
            Propagation::Skipped { cleared_stale: true }
        );
        assert_eq!(recorded(&result), "");
    }
}
