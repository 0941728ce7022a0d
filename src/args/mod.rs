//! Argument lookup abstraction
//!
//! Composers never parse argv themselves; they read named flags through the
//! `ArgSource` trait. The CLI binary chains a flag map over the process
//! environment, and tests substitute a plain map.

use serde_json::Value;
use std::collections::BTreeMap;

/// Pure lookup of a named flag from combined CLI/environment input.
///
/// Every composer takes its `ArgSource` as an explicit parameter; there is no
/// process-wide singleton.
pub trait ArgSource {
    /// Look up a flag by its kebab-case name (e.g. `record-videos`).
    fn get_arg(&self, flag: &str) -> Option<Value>;
}

/// An `ArgSource` with no arguments at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullArgSource;

impl ArgSource for NullArgSource {
    fn get_arg(&self, _flag: &str) -> Option<Value> {
        None
    }
}

/// A fixed map of flag values. Used by the CLI layer and by tests.
#[derive(Debug, Default, Clone)]
pub struct MapArgSource {
    values: BTreeMap<String, Value>,
}

impl MapArgSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(flag.into(), value.into());
        self
    }
}

impl FromIterator<(String, Value)> for MapArgSource {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl ArgSource for MapArgSource {
    fn get_arg(&self, flag: &str) -> Option<Value> {
        self.values.get(flag).cloned()
    }
}

/// Reads flags from environment variables.
///
/// A flag `record-logs` with prefix `DEVLANE` maps to `DEVLANE_RECORD_LOGS`.
/// Values come back as strings; `bool_arg` normalizes booleans.
#[derive(Debug, Clone)]
pub struct EnvArgSource {
    prefix: String,
}

impl EnvArgSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, flag: &str) -> String {
        format!(
            "{}_{}",
            self.prefix,
            flag.replace('-', "_").to_ascii_uppercase()
        )
    }
}

impl Default for EnvArgSource {
    fn default() -> Self {
        Self::new("DEVLANE")
    }
}

impl ArgSource for EnvArgSource {
    fn get_arg(&self, flag: &str) -> Option<Value> {
        std::env::var(self.var_name(flag)).ok().map(Value::String)
    }
}

/// Chains multiple sources; the first one that defines a flag wins.
pub struct ChainArgSource {
    sources: Vec<Box<dyn ArgSource>>,
}

impl ChainArgSource {
    pub fn new(sources: Vec<Box<dyn ArgSource>>) -> Self {
        Self { sources }
    }
}

impl ArgSource for ChainArgSource {
    fn get_arg(&self, flag: &str) -> Option<Value> {
        self.sources.iter().find_map(|s| s.get_arg(flag))
    }
}

/// Read a flag as a string, ignoring non-string values.
pub fn str_arg(args: &dyn ArgSource, flag: &str) -> Option<String> {
    match args.get_arg(flag)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Read a flag as a boolean.
///
/// Accepts real booleans and the string forms `"true"` / `"false"` / `"1"` /
/// `"0"` that arrive through the environment.
pub fn bool_arg(args: &dyn ArgSource, flag: &str) -> Option<bool> {
    match args.get_arg(flag)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
