//! The dynamic context: run-time parameters written by executed nodes.

use imfconv_common::{Error, Result};
use indexmap::IndexMap;

/// One dynamic parameter entry.
#[derive(Debug, Clone)]
pub struct DynamicValue {
    value: String,
    delete_on_exit: bool,
}

impl DynamicValue {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn delete_on_exit(&self) -> bool {
        self.delete_on_exit
    }
}

/// Flat name → value store mutated throughout the run.
///
/// Values handed to [`add`](DynamicContext::add) and
/// [`append`](DynamicContext::append) must already be fully resolved; the
/// store never re-resolves at read time. Entries flagged delete-on-exit name
/// filesystem paths that are removed when the run ends.
#[derive(Debug, Clone, Default)]
pub struct DynamicContext {
    values: IndexMap<String, DynamicValue>,
}

impl DynamicContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, overwriting any previous value and flag.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>, delete_on_exit: bool) {
        self.values.insert(
            name.into(),
            DynamicValue {
                value: value.into(),
                delete_on_exit,
            },
        );
    }

    /// Concatenate onto an existing parameter, creating it on first use.
    ///
    /// The delete-on-exit flag is sticky: once set by any write it stays set.
    pub fn append(&mut self, name: impl Into<String>, value: &str, delete_on_exit: bool) {
        match self.values.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                entry.value.push_str(value);
                entry.delete_on_exit |= delete_on_exit;
            }
            indexmap::map::Entry::Vacant(e) => {
                e.insert(DynamicValue {
                    value: value.to_string(),
                    delete_on_exit,
                });
            }
        }
    }

    /// Look up a parameter value.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.values
            .get(name)
            .map(|v| v.value.as_str())
            .ok_or_else(|| Error::not_found("dynamic", name, "parameter has not been set"))
    }

    /// Whether a parameter has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All entries in first-write order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DynamicValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values flagged for deletion when the run ends.
    pub fn delete_on_exit_values(&self) -> impl Iterator<Item = &str> {
        self.values
            .values()
            .filter(|v| v.delete_on_exit)
            .map(|v| v.value.as_str())
    }
}
