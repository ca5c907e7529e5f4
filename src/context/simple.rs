//! Static name/value contexts populated once from configuration.

use imfconv_common::{Error, Result};
use indexmap::IndexMap;

/// A flat name → value store loaded before the run and never mutated after.
///
/// Backs both the tool context (external program definitions) and the tmp
/// context (scratch values shared across operations). The `scope` label only
/// feeds error reports.
#[derive(Debug, Clone)]
pub struct StaticContext {
    scope: &'static str,
    values: IndexMap<String, String>,
}

impl StaticContext {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            values: IndexMap::new(),
        }
    }

    /// Define a parameter. Later definitions overwrite earlier ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a parameter value.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::not_found(self.scope, name, "parameter is not defined"))
    }

    /// All definitions in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
