//! Core data structures for driver-gate.
//!
//! This module contains the foundational types used throughout the crate:
//! - Driver identifiers and the on-disk naming convention
//! - The driver registry discovered from a source tree
//! - Selections and their validation
//! - The record carried between build phases

pub mod driver_id;
pub mod errors;
pub mod layout;
pub mod record;
pub mod registry;
pub mod selection;

pub use driver_id::DriverId;
pub use errors::GateError;
pub use layout::{DriverLayout, SourceFileState};
pub use record::BuildEnvironmentRecord;
pub use registry::{discover, DriverRegistry};
pub use selection::{
    validate, validate_choice, DriverChoice, Selection, SelectionInput, ValidateOptions,
};
