use std::fmt;

use serde::{Deserialize, Serialize};

/// Polymorphic pointer to an audited record: a stable type tag plus the
/// record's id within that type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.entity_id)
    }
}

/// Who performed a change, or on whose behalf it happened.
///
/// Used for both the acting user and the owning tenant. A party is either
/// a reference to another record or a free-form display name, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Reference { party_type: String, id: String },
    Name(String),
}

/// Flat column triple `(id, type, name)` as persisted in the log.
pub type PartyColumns = (Option<String>, Option<String>, Option<String>);

impl Party {
    pub fn reference(party_type: impl Into<String>, id: impl Into<String>) -> Self {
        Party::Reference {
            party_type: party_type.into(),
            id: id.into(),
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Party::Name(name.into())
    }

    /// Parse the CLI form: `Type:id` is a reference, anything else a name.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() && !kind.contains(' ') => {
                Party::reference(kind, id)
            }
            _ => Party::name(raw),
        }
    }

    /// Split into the `(id, type, name)` column triple. Exactly one side
    /// is populated.
    pub fn to_columns(party: Option<&Party>) -> PartyColumns {
        match party {
            Some(Party::Reference { party_type, id }) => {
                (Some(id.clone()), Some(party_type.clone()), None)
            }
            Some(Party::Name(name)) => (None, None, Some(name.clone())),
            None => (None, None, None),
        }
    }

    /// Rebuild from the column triple. A complete reference wins over a
    /// stray name; a half-filled reference falls back to the name.
    pub fn from_columns(
        id: Option<String>,
        party_type: Option<String>,
        name: Option<String>,
    ) -> Option<Self> {
        match (id, party_type, name) {
            (Some(id), Some(party_type), _) => Some(Party::Reference { party_type, id }),
            (_, _, Some(name)) => Some(Party::Name(name)),
            _ => None,
        }
    }

    /// Case-insensitive match used by log filters. References match on
    /// `Type:id` or the bare id.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            Party::Reference { party_type, id } => {
                id.to_lowercase() == needle
                    || format!("{party_type}:{id}").to_lowercase() == needle
            }
            Party::Name(name) => name.to_lowercase().contains(&needle),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Reference { party_type, id } => write!(f, "{party_type}:{id}"),
            Party::Name(name) => f.write_str(name),
        }
    }
}
