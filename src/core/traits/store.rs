use chrono::{DateTime, Utc};

use crate::core::errors::Result;
use crate::core::models::audit_record::AuditRecord;
use crate::core::models::reference::{EntityRef, Party};

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another writer already holds this version, or the log moved on
    /// since the version was computed.
    Conflict,
}

/// Filters for cross-entity log queries. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity: Option<EntityRef>,
    pub actor: Option<String>,
    pub tenant: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        let party_matches = |party: Option<&Party>, needle: Option<&str>| match needle {
            None => true,
            Some(needle) => party.is_some_and(|p| p.matches(needle)),
        };

        self.entity.as_ref().is_none_or(|e| *e == record.entity)
            && party_matches(record.actor.as_ref(), self.actor.as_deref())
            && party_matches(record.tenant.as_ref(), self.tenant.as_deref())
            && self.since.is_none_or(|since| record.created_at >= since)
    }
}

/// Port for the append-only audit log.
///
/// Implementations must make `insert_next` atomic: the check that
/// `record.version` is exactly one past the entity's current maximum and
/// the append happen as one unit with respect to every other writer.
pub trait AuditStore: Send + Sync {
    /// Highest version recorded for `entity`, if any.
    fn max_version(&self, entity: &EntityRef) -> Result<Option<u32>>;

    /// Append `record` if its version is the entity's next one.
    fn insert_next(&self, record: &AuditRecord) -> Result<InsertOutcome>;

    /// Records for `entity` in ascending version order, optionally only
    /// those with `version <= up_to`.
    fn records(&self, entity: &EntityRef, up_to: Option<u32>) -> Result<Vec<AuditRecord>>;

    /// The record with the greatest `created_at` not after `at`.
    fn latest_at(&self, entity: &EntityRef, at: DateTime<Utc>) -> Result<Option<AuditRecord>>;

    /// All records matching `filter`, oldest first.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>>;

    /// Operator deletion of one record. Returns whether anything was removed.
    fn remove(&self, entity: &EntityRef, version: u32) -> Result<bool>;
}
