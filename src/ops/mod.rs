//! High-level operations.
//!
//! This module contains the implementation of driver-gate commands.

pub mod build_env;
pub mod configure;
pub mod filter;
pub mod manifest_filter;
pub mod propagate;

pub use build_env::{BuildEnvironment, IncludeLookup, RecordSource};
pub use configure::{configure, ConfigureOptions, ConfigureResult, InstanceChoice};
pub use filter::{filter_drivers, FilterFailure, FilterOutcome, FilterReport, RenameAction};
pub use manifest_filter::ResourceFilter;
pub use propagate::{propagate, propagate_to_file, Propagation, PropagationKeys};
