use serde::Serialize;
use serde_json::Value;

use crate::core::models::change_set::Attributes;

/// An entity's attribute state as of one point in its history.
///
/// Turning this into a live typed instance is the host's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision {
    pub version: u32,
    pub attributes: Attributes,
}

impl Revision {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Attribute names whose value here differs from `live`.
    pub fn changed_from(&self, live: &Attributes) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(k, v)| live.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The attribute map with the version marker merged in, the shape
    /// handed to hosts and printed by the CLI.
    pub fn to_map(&self) -> Attributes {
        let mut map = self.attributes.clone();
        map.insert("version".to_string(), Value::from(self.version));
        map
    }
}
