use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Attribute name to typed value, as handed over by the host.
pub type Attributes = BTreeMap<String, Value>;

/// One attribute's transition. `None` means "absent": `old` on create,
/// `new` on destroy.
///
/// Persisted as a two-element array `[old, new]`. Reading is lenient: a
/// bare scalar or a one-element array is taken as the new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl Change {
    pub fn new(old: Option<Value>, new: Option<Value>) -> Self {
        Self { old, new }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.old, &self.new).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Change {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let present = |v: Value| (!v.is_null()).then_some(v);
        let change = match Value::deserialize(deserializer)? {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                let old = items.next().and_then(present);
                let new = items.next().and_then(present);
                Change { old, new }
            }
            Value::Array(items) => Change {
                old: None,
                new: items.into_iter().last().and_then(present),
            },
            scalar => Change {
                old: None,
                new: present(scalar),
            },
        };
        Ok(change)
    }
}

/// The attribute-level diff of a single lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, Change>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: impl Into<String>, change: Change) {
        self.0.insert(attribute.into(), change);
    }

    pub fn get(&self, attribute: &str) -> Option<&Change> {
        self.0.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.0.iter()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The state after the event. Attributes that became absent map to null.
    pub fn new_attributes(&self) -> Attributes {
        self.0
            .iter()
            .map(|(k, c)| (k.clone(), c.new.clone().unwrap_or(Value::Null)))
            .collect()
    }

    /// The state before the event. Attributes that did not exist map to null.
    pub fn old_attributes(&self) -> Attributes {
        self.0
            .iter()
            .map(|(k, c)| (k.clone(), c.old.clone().unwrap_or(Value::Null)))
            .collect()
    }
}

impl FromIterator<(String, Change)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (String, Change)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
