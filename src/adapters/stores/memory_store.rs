use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::AuditRecord;
use crate::core::models::reference::EntityRef;
use crate::core::traits::store::{AuditFilter, AuditStore, InsertOutcome};

/// Audit store held in process memory, keyed by entity.
///
/// Each entity's records are kept sorted by version. A single mutex makes
/// the check-and-append of `insert_next` atomic.
#[derive(Default)]
pub struct InMemoryAuditStore {
    entities: Mutex<HashMap<EntityRef, Vec<AuditRecord>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<EntityRef, Vec<AuditRecord>>>> {
        self.entities
            .lock()
            .map_err(|_| RevtrailError::StorageUnavailable {
                detail: "in-memory audit store lock poisoned".into(),
            })
    }

    /// Total number of records across all entities.
    pub fn len(&self) -> usize {
        self.lock().map(|m| m.values().map(Vec::len).sum()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for InMemoryAuditStore {
    fn max_version(&self, entity: &EntityRef) -> Result<Option<u32>> {
        Ok(self
            .lock()?
            .get(entity)
            .and_then(|records| records.last())
            .map(|r| r.version))
    }

    fn insert_next(&self, record: &AuditRecord) -> Result<InsertOutcome> {
        let mut entities = self.lock()?;
        let records = entities.entry(record.entity.clone()).or_default();
        let expected = records.last().map_or(1, |r| r.version + 1);
        if record.version != expected {
            return Ok(InsertOutcome::Conflict);
        }
        records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn records(&self, entity: &EntityRef, up_to: Option<u32>) -> Result<Vec<AuditRecord>> {
        Ok(self
            .lock()?
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| up_to.is_none_or(|max| r.version <= max))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn latest_at(&self, entity: &EntityRef, at: DateTime<Utc>) -> Result<Option<AuditRecord>> {
        Ok(self.lock()?.get(entity).and_then(|records| {
            records
                .iter()
                .filter(|r| r.created_at <= at)
                .max_by_key(|r| (r.created_at, r.version))
                .cloned()
        }))
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>> {
        let entities = self.lock()?;
        let mut found: Vec<AuditRecord> = entities
            .values()
            .flatten()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (a.created_at, &a.entity, a.version).cmp(&(b.created_at, &b.entity, b.version))
        });
        Ok(found)
    }

    fn remove(&self, entity: &EntityRef, version: u32) -> Result<bool> {
        let mut entities = self.lock()?;
        let Some(records) = entities.get_mut(entity) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| r.version != version);
        Ok(records.len() != before)
    }
}
