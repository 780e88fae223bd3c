//! driver-gate - build-time selection of optional decoder drivers
//!
//! This crate provides the library side of driver-gate: discovering the
//! drivers a component ships, validating a user selection against them,
//! recording it in the build environment, and toggling driver sources so
//! that only the selected ones reach the compiler.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities for driver-gate unit tests.
///
/// Only available when compiling tests. Provides a temporary driver source
/// tree builder.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    discover, validate, validate_choice, BuildEnvironmentRecord, DriverChoice, DriverId,
    DriverLayout, DriverRegistry, GateError, Selection, SelectionInput, SourceFileState,
};

pub use crate::ops::{configure, filter_drivers, BuildEnvironment, FilterReport, ResourceFilter};
pub use crate::util::context::GlobalContext;
