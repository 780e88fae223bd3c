//! Selection propagation.
//!
//! Records the resolved selection in the build environment so the filtering
//! phase can read it back without re-running configuration. Two channels are
//! written: a compiler-visible define for conditionally compiled code, and a
//! build-tool option for tooling that runs before defines are observable.

use anyhow::Result;
use serde::Serialize;

use crate::core::record::BuildEnvironmentRecord;
use crate::core::selection::Selection;
use crate::ops::build_env::BuildEnvironment;
use crate::util::config::{Config, DEFAULT_DEFINE, DEFAULT_OPTION};

/// Names of the two propagation channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationKeys {
    /// Compiler-visible define
    pub define: String,

    /// Build-tool option key
    pub option: String,
}

impl Default for PropagationKeys {
    fn default() -> Self {
        PropagationKeys {
            define: DEFAULT_DEFINE.to_string(),
            option: DEFAULT_OPTION.to_string(),
        }
    }
}

impl PropagationKeys {
    pub fn from_config(config: &Config) -> Self {
        PropagationKeys {
            define: config.define_name().to_string(),
            option: config.option_key().to_string(),
        }
    }
}

/// What propagation did to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Propagation {
    /// Both channels now carry `value`.
    Recorded { value: String },
    /// Empty selection; nothing recorded.
    Skipped {
        /// A value left by an earlier configuration pass was removed.
        cleared_stale: bool,
    },
}

/// Write the selection into the build environment.
///
/// An empty selection records nothing. A value written by a previous
/// configuration pass is removed in that case, because absent and empty must
/// both mean "leave the tree alone" for the next filter run.
pub fn propagate(
    selection: &Selection,
    env: &mut BuildEnvironment,
    keys: &PropagationKeys,
) -> Propagation {
    if selection.is_empty() {
        let removed_define = env.remove_define(&keys.define);
        let removed_option = env.remove_option(&keys.option);
        let cleared_stale = removed_define || removed_option;

        if cleared_stale {
            tracing::info!("no drivers selected; cleared stale driver list from build environment");
        } else {
            tracing::debug!("no drivers selected; nothing to propagate");
        }

        return Propagation::Skipped { cleared_stale };
    }

    let value = BuildEnvironmentRecord::from(selection).to_string();

    env.set_define(&keys.define, &value);
    env.set_option(&keys.option, &value);

    tracing::debug!("propagated {}={}", keys.option, value);

    Propagation::Recorded { value }
}

/// Propagate and persist in one step.
pub fn propagate_to_file(
    selection: &Selection,
    env: &mut BuildEnvironment,
    keys: &PropagationKeys,
) -> Result<Propagation> {
    let outcome = propagate(selection, env, keys);

    let changed = match outcome {
        Propagation::Recorded { .. } => true,
        Propagation::Skipped { cleared_stale } => cleared_stale,
    };
    if changed {
        env.save()?;
    }

    Ok(outcome)
}
