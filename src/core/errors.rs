//! Error types for driver discovery, selection and propagation.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Errors raised while building or checking a driver selection.
///
/// All of these are fatal to the configuration phase. Filesystem problems
/// during filtering are not represented here; they are collected per file in
/// the filter report instead.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("unknown driver `{name}` (allowed: {})", .allowed.join(", "))]
    UnknownDriver { name: String, allowed: Vec<String> },

    #[error("driver selection `{value}` must be a list or `all`")]
    ScalarSelection { value: String },

    #[error("invalid driver identifier `{raw}`: {reason}")]
    InvalidDriverId { raw: String, reason: String },

    #[error("driver source directory not found: {}", .path.display())]
    SourceDirNotFound { path: PathBuf },

    #[error("selected drivers missing from registry after validation: {}", .drivers.join(", "))]
    InvariantViolation { drivers: Vec<String> },
}

impl GateError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GateError::UnknownDriver { name, allowed } => {
                let mut diag = Diagnostic::error(format!("unknown driver `{}`", name));

                if allowed.is_empty() {
                    diag = diag.with_context("no drivers were found in the source directory");
                } else {
                    diag = diag.with_context(format!("allowed values: {}", allowed.join(", ")));
                }

                let similar = similar_names(name, allowed);
                if !similar.is_empty() {
                    diag = diag.with_context(format!("did you mean: {}?", similar.join(", ")));
                }

                diag.with_suggestion(suggestions::LIST_DRIVERS)
            }

            GateError::ScalarSelection { value } => {
                Diagnostic::error(format!("driver selection `{}` is not a list", value))
                    .with_suggestion(format!("Write `select = [\"{}\"]`", value))
                    .with_suggestion("Set `permissive = true` under [drivers]")
            }

            GateError::InvalidDriverId { raw, reason } => {
                Diagnostic::error(format!("invalid driver identifier `{}`", raw))
                    .with_context(reason.clone())
                    .with_suggestion(
                        "Driver identifiers may only contain letters, digits, spaces, `-` and `_`",
                    )
            }

            GateError::SourceDirNotFound { path } => {
                Diagnostic::error("driver source directory not found")
                    .with_location(path)
                    .with_suggestion(suggestions::SOURCE_DIR)
            }

            GateError::InvariantViolation { drivers } => Diagnostic::error(
                "internal error: selection escaped the driver registry",
            )
            .with_context(format!("offending drivers: {}", drivers.join(", ")))
            .with_suggestion(suggestions::REPORT_BUG),
        }
    }
}

/// Allowed names sharing a prefix with, or containing, the rejected name.
fn similar_names(name: &str, allowed: &[String]) -> Vec<String> {
    let needle = crate::core::driver_id::normalize(name);
    if needle.len() < 3 {
        return Vec::new();
    }

    let prefix = needle.get(..3).unwrap_or(needle.as_str());

    allowed
        .iter()
        .filter(|a| a.contains(&needle) || needle.contains(a.as_str()) || a.starts_with(prefix))
        .cloned()
        .collect()
}
