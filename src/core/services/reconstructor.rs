use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::core::errors::Result;
use crate::core::models::audit_record::{AuditAction, AuditRecord};
use crate::core::models::change_set::Attributes;
use crate::core::models::reference::EntityRef;
use crate::core::models::revision::Revision;
use crate::core::models::schema::EntitySchema;
use crate::core::services::registry::EntityRegistry;
use crate::core::traits::store::AuditStore;

/// Fold one record into `state`.
///
/// Creates and updates contribute their new values; a destroy contributes
/// the final state it captured. Attributes the live schema no longer has,
/// and values that cannot be cast to the declared type, are skipped with
/// a warning so a damaged history never blocks reconstruction.
pub fn apply(state: &mut Attributes, record: &AuditRecord, schema: &EntitySchema) {
    for (attribute, change) in record.change_set.iter() {
        if !schema.knows(attribute) {
            tracing::warn!(
                entity = %record.entity,
                version = record.version,
                attribute = %attribute,
                "skipping attribute unknown to the current schema"
            );
            continue;
        }

        let side = match record.action {
            AuditAction::Destroy => change.new.as_ref().or(change.old.as_ref()),
            AuditAction::Create | AuditAction::Update => change.new.as_ref(),
        };
        let raw = side.cloned().unwrap_or(Value::Null);

        let value = match schema.attributes.get(attribute.as_str()) {
            Some(kind) => match kind.try_cast(&raw) {
                Some(cast) => cast,
                None => {
                    tracing::warn!(
                        entity = %record.entity,
                        version = record.version,
                        attribute = %attribute,
                        "skipping value incompatible with declared type"
                    );
                    continue;
                }
            },
            None => raw,
        };
        state.insert(attribute.clone(), value);
    }
}

/// Rebuilds historical attribute state by replaying an entity's records.
pub struct Reconstructor<'a> {
    store: &'a dyn AuditStore,
    registry: &'a EntityRegistry,
}

impl<'a> Reconstructor<'a> {
    pub fn new(store: &'a dyn AuditStore, registry: &'a EntityRegistry) -> Self {
        Self { store, registry }
    }

    /// State as of `target` version.
    ///
    /// Replays every surviving record with `version <= target`. The result
    /// carries `target` as its version even when that exact record was
    /// removed. `None` when no record at or before `target` exists.
    pub fn reconstruct(&self, entity: &EntityRef, target: u32) -> Result<Option<Revision>> {
        if target == 0 {
            return Ok(None);
        }
        let records = self.store.records(entity, Some(target))?;
        if records.is_empty() {
            return Ok(None);
        }

        let schema = self.registry.schema(&entity.entity_type);
        let mut attributes = Attributes::new();
        for record in &records {
            apply(&mut attributes, record, &schema);
        }

        Ok(Some(Revision {
            version: target,
            attributes,
        }))
    }

    /// State as of the newest record created no later than `at`.
    pub fn revision_at(&self, entity: &EntityRef, at: DateTime<Utc>) -> Result<Option<Revision>> {
        match self.store.latest_at(entity, at)? {
            Some(record) => self.reconstruct(entity, record.version),
            None => Ok(None),
        }
    }

    /// State `offset` versions back from the newest one; `1` is the
    /// previous revision. `None` when that would fall before version 1.
    pub fn relative(&self, entity: &EntityRef, offset: u32) -> Result<Option<Revision>> {
        let Some(latest) = self.store.max_version(entity)? else {
            return Ok(None);
        };
        match latest.checked_sub(offset) {
            Some(target) if target >= 1 => self.reconstruct(entity, target),
            _ => Ok(None),
        }
    }

    /// One revision per surviving record, oldest first, each holding the
    /// accumulated state after that record. With `from_version`, earlier
    /// revisions are still replayed but not returned.
    pub fn revisions(
        &self,
        entity: &EntityRef,
        from_version: Option<u32>,
    ) -> Result<Vec<Revision>> {
        let records = self.store.records(entity, None)?;
        let schema = self.registry.schema(&entity.entity_type);
        let from = from_version.unwrap_or(1);

        let mut attributes = Attributes::new();
        let mut revisions = Vec::new();
        for record in &records {
            apply(&mut attributes, record, &schema);
            if record.version >= from {
                revisions.push(Revision {
                    version: record.version,
                    attributes: attributes.clone(),
                });
            }
        }
        Ok(revisions)
    }
}
