use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use tracing::warn;

use crate::core::errors::{Result, RevtrailError};
use crate::core::models::change_set::Attributes;
use crate::core::models::schema::EntitySchema;
use crate::core::traits::repository::EntityRepository;

/// Repository backed by a schema and an optional in-memory table of live
/// records. Types declared only in configuration use it with an empty
/// table: reconstruction gets the schema, live lookups find nothing.
pub struct MemoryRepository {
    schema: EntitySchema,
    live: RwLock<HashMap<String, Attributes>>,
}

impl MemoryRepository {
    pub fn new(schema: EntitySchema) -> Self {
        Self {
            schema,
            live: RwLock::new(HashMap::new()),
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Attributes>>> {
        self.live
            .write()
            .map_err(|_| RevtrailError::StorageUnavailable {
                detail: format!("live table for {} poisoned", self.schema.entity_type),
            })
    }

    /// Store or replace the live state of record `id`.
    pub fn put(&self, id: impl Into<String>, attributes: Attributes) -> Result<()> {
        self.write()?.insert(id.into(), attributes);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<Option<Attributes>> {
        Ok(self.write()?.remove(id))
    }
}

impl EntityRepository for MemoryRepository {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn find(&self, id: &str) -> Option<Attributes> {
        match self.live.read() {
            Ok(live) => live.get(id).cloned(),
            Err(_) => {
                warn!(entity_type = %self.schema.entity_type, "live table poisoned");
                None
            }
        }
    }
}
