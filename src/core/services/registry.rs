use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::errors::{Result, RevtrailError};
use crate::core::models::change_set::Attributes;
use crate::core::models::reference::EntityRef;
use crate::core::models::schema::EntitySchema;
use crate::core::traits::repository::EntityRepository;

/// Maps entity type tags to the host repositories that own them.
#[derive(Default, Clone)]
pub struct EntityRegistry {
    repositories: HashMap<String, Arc<dyn EntityRepository>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `repository` under its schema's type tag, replacing any
    /// previous registration.
    pub fn register(&mut self, repository: Arc<dyn EntityRepository>) {
        let tag = repository.schema().entity_type.clone();
        self.repositories.insert(tag, repository);
    }

    pub fn get(&self, entity_type: &str) -> Result<&Arc<dyn EntityRepository>> {
        self.repositories
            .get(entity_type)
            .ok_or_else(|| RevtrailError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }

    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.repositories.contains_key(entity_type)
    }

    /// Schema for `entity_type`. Unregistered types get an open schema:
    /// untyped, nothing excluded beyond the global denylist.
    pub fn schema(&self, entity_type: &str) -> Cow<'_, EntitySchema> {
        match self.repositories.get(entity_type) {
            Some(repo) => Cow::Borrowed(repo.schema()),
            None => Cow::Owned(EntitySchema::new(entity_type)),
        }
    }

    /// Current attributes of the live record behind `entity`.
    pub fn live(&self, entity: &EntityRef) -> Result<Option<Attributes>> {
        Ok(self.get(&entity.entity_type)?.find(&entity.entity_id))
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }
}
