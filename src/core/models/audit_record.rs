use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::change_set::ChangeSet;
use crate::core::models::reference::{EntityRef, Party};

/// Lifecycle event that produced an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Destroy,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Destroy => "destroy",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "destroy" | "delete" => Ok(AuditAction::Destroy),
            other => Err(format!(
                "unknown action '{other}' (expected create, update or destroy)"
            )),
        }
    }
}

/// A diffed event whose actor and tenant are resolved but which has no
/// version yet. The store turns it into an [`AuditRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub entity: EntityRef,
    pub actor: Option<Party>,
    pub tenant: Option<Party>,
    pub action: AuditAction,
    pub change_set: ChangeSet,
}

impl PendingRecord {
    /// Stamp a version and creation time onto the pending record.
    pub fn into_record(self, version: u32, created_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            entity: self.entity,
            actor: self.actor,
            tenant: self.tenant,
            action: self.action,
            change_set: self.change_set,
            version,
            created_at,
        }
    }
}

/// One immutable entry of an entity's audit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredRecord", try_from = "StoredRecord")]
pub struct AuditRecord {
    pub entity: EntityRef,
    pub actor: Option<Party>,
    pub tenant: Option<Party>,
    pub action: AuditAction,
    pub change_set: ChangeSet,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

/// Flat row layout of the log: one column per field, parties split into
/// `(id, type, name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub entity_id: String,
    pub entity_type: String,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub tenant_type: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    pub action: AuditAction,
    #[serde(default)]
    pub change_set: ChangeSet,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRecord> for StoredRecord {
    fn from(record: AuditRecord) -> Self {
        let (actor_id, actor_type, actor_name) = Party::to_columns(record.actor.as_ref());
        let (tenant_id, tenant_type, tenant_name) = Party::to_columns(record.tenant.as_ref());
        StoredRecord {
            entity_id: record.entity.entity_id,
            entity_type: record.entity.entity_type,
            actor_id,
            actor_type,
            actor_name,
            tenant_id,
            tenant_type,
            tenant_name,
            action: record.action,
            change_set: record.change_set,
            version: record.version,
            created_at: record.created_at,
        }
    }
}

impl TryFrom<StoredRecord> for AuditRecord {
    type Error = String;

    fn try_from(row: StoredRecord) -> Result<Self, Self::Error> {
        if row.version == 0 {
            return Err(format!(
                "record for {}#{} has version 0; versions start at 1",
                row.entity_type, row.entity_id
            ));
        }
        Ok(AuditRecord {
            entity: EntityRef::new(row.entity_type, row.entity_id),
            actor: Party::from_columns(row.actor_id, row.actor_type, row.actor_name),
            tenant: Party::from_columns(row.tenant_id, row.tenant_type, row.tenant_name),
            action: row.action,
            change_set: row.change_set,
            version: row.version,
            created_at: row.created_at,
        })
    }
}
