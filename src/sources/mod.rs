//! Resource sources.
//!
//! Sources enumerate the files a build host would compile for a component.
//! Driver filtering at manifest level works on their output.

pub mod collector;
pub mod source;

pub use collector::{SourceCollector, WidenedCollector, DEFAULT_SOURCE_EXTENSIONS};
pub use source::ResourceSource;
