use crate::error::BuildError;
use pathwright_tree::DEFAULT_ATTRIBUTE_PREFIX;
use pathwright_xpath::Limits;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Tunables for a `PathBuilder`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Largest position a positional predicate may create, e.g. `item[500]`.
    pub max_position: usize,
    /// Key prefix that marks a JSON member as an attribute when a raw
    /// `serde_json::Value` is converted for evaluation.
    pub json_attribute_prefix: String,
    /// Prefix to URI bindings for prefixed names in paths, applied to XML
    /// documents before effects run.
    pub namespaces: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_position: Limits::default().max_position,
            json_attribute_prefix: DEFAULT_ATTRIBUTE_PREFIX.to_string(),
            namespaces: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_position: self.max_position,
        }
    }
}
