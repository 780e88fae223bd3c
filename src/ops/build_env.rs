//! Build environment file I/O.
//!
//! The build environment is a small TOML file shared between the
//! configuration phase and the pre-compilation phase (which may run in a
//! different process). It has two channels:
//!
//! ```toml
//! defines = ["ESPHOME_WMBUS_INCLUDE_DRIVERS=\"amiplus,izar\"", "USE_WMBUS"]
//!
//! [options]
//! include_drivers = "amiplus,izar"
//! ```
//!
//! `defines` mirrors the compiler's preprocessor definitions; entries may also
//! be written as `["NAME", "value"]` pairs. `options` holds plain build-tool
//! keys. The host may keep its own entries in the same file, so edits go
//! through `toml_edit` and leave everything else untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use toml_edit::{value, Array, DocumentMut, Item, Table, Value};

use crate::core::record::BuildEnvironmentRecord;
use crate::util::fs;

const DEFINES_KEY: &str = "defines";
const OPTIONS_KEY: &str = "options";

/// A loaded build environment file.
#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    path: PathBuf,
    doc: DocumentMut,
}

/// Where the include record was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RecordSource {
    /// Neither channel carries a value.
    Absent,
    /// Only the build-tool option is set.
    Option,
    /// Only the define is set.
    Define,
    /// Both are set and agree.
    Both,
    /// Both are set and differ; the option wins.
    Disagreement { option: String, define: String },
}

/// The include record together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeLookup {
    pub record: BuildEnvironmentRecord,
    pub source: RecordSource,
}

impl BuildEnvironment {
    /// Load the environment file; a missing file is an empty environment.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            fs::read_to_string(path)?
                .parse::<DocumentMut>()
                .with_context(|| format!("failed to parse build environment: {}", path.display()))?
        } else {
            DocumentMut::new()
        };

        Ok(BuildEnvironment {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Write the environment back atomically.
    pub fn save(&self) -> Result<()> {
        fs::write_atomic(&self.path, &self.doc.to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of a define, without surrounding quotes.
    ///
    /// A bare `NAME` define yields an empty string.
    pub fn define(&self, name: &str) -> Option<String> {
        let defines = self.doc.get(DEFINES_KEY)?.as_array()?;
        defines.iter().find_map(|entry| parse_define(entry, name))
    }

    /// Set `NAME="value"`, replacing any previous definition of `NAME`.
    pub fn set_define(&mut self, name: &str, define_value: &str) {
        self.remove_define(name);

        let entry = format!("{}=\"{}\"", name, define_value);
        match self.doc.get_mut(DEFINES_KEY).and_then(Item::as_array_mut) {
            Some(defines) => defines.push(entry),
            None => {
                let mut defines = Array::new();
                defines.push(entry);
                self.doc[DEFINES_KEY] = value(defines);
            }
        }
    }

    /// Remove every definition of `NAME`. Returns whether anything was removed.
    pub fn remove_define(&mut self, name: &str) -> bool {
        let Some(defines) = self.doc.get_mut(DEFINES_KEY).and_then(Item::as_array_mut) else {
            return false;
        };

        let before = defines.len();
        defines.retain(|entry| parse_define(entry, name).is_none());
        before != defines.len()
    }

    /// Value of a build-tool option.
    pub fn option(&self, key: &str) -> Option<String> {
        self.doc
            .get(OPTIONS_KEY)?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }

    /// Set a build-tool option.
    pub fn set_option(&mut self, key: &str, option_value: &str) {
        if !self.doc.contains_table(OPTIONS_KEY) {
            self.doc[OPTIONS_KEY] = Item::Table(Table::new());
        }
        self.doc[OPTIONS_KEY][key] = value(option_value);
    }

    /// Remove a build-tool option. Returns whether it was present.
    pub fn remove_option(&mut self, key: &str) -> bool {
        self.doc
            .get_mut(OPTIONS_KEY)
            .and_then(Item::as_table_like_mut)
            .and_then(|options| options.remove(key))
            .is_some()
    }

    /// Read the include record back.
    ///
    /// The build-tool option is authoritative. The define is informational;
    /// it is only used when the option is missing, and a disagreement between
    /// the two is reported rather than silently resolved.
    pub fn include_record(&self, define: &str, option: &str) -> Result<IncludeLookup> {
        let option_raw = self.option(option).filter(|v| !v.trim().is_empty());
        let define_raw = self.define(define).filter(|v| !v.trim().is_empty());

        let parse = |raw: &str, channel: &str| {
            BuildEnvironmentRecord::parse(raw).with_context(|| {
                format!(
                    "malformed driver list in {} of {}",
                    channel,
                    self.path.display()
                )
            })
        };

        let lookup = match (option_raw, define_raw) {
            (None, None) => IncludeLookup {
                record: BuildEnvironmentRecord::unrestricted(),
                source: RecordSource::Absent,
            },
            (Some(o), None) => IncludeLookup {
                record: parse(&o, "option")?,
                source: RecordSource::Option,
            },
            (None, Some(d)) => IncludeLookup {
                record: parse(&d, "define")?,
                source: RecordSource::Define,
            },
            (Some(o), Some(d)) => {
                let from_option = parse(&o, "option")?;
                let from_define = parse(&d, "define")?;

                let source = if from_option == from_define {
                    RecordSource::Both
                } else {
                    tracing::warn!(
                        "build environment disagrees: {}={:?} but {}={:?}; using {}",
                        option,
                        from_option.to_string(),
                        define,
                        from_define.to_string(),
                        option
                    );
                    RecordSource::Disagreement {
                        option: from_option.to_string(),
                        define: from_define.to_string(),
                    }
                };

                IncludeLookup {
                    record: from_option,
                    source,
                }
            }
        };

        Ok(lookup)
    }
}

/// Match one `defines` entry against `name`, returning its value.
fn parse_define(entry: &Value, name: &str) -> Option<String> {
    match entry {
        Value::String(s) => {
            let s = s.value();
            match s.split_once('=') {
                Some((key, val)) if key.trim() == name => Some(unquote(val)),
                None if s.trim() == name => Some(String::new()),
                _ => None,
            }
        }
        Value::Array(pair) if pair.len() == 2 => {
            let key = pair.get(0)?.as_str()?;
            if key != name {
                return None;
            }
            match pair.get(1)? {
                Value::String(s) => Some(unquote(s.value())),
                other => Some(other.to_string().trim().to_string()),
            }
        }
        _ => None,
    }
}

fn unquote(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}
