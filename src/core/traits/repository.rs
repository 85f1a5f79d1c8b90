use crate::core::models::change_set::Attributes;
use crate::core::models::schema::EntitySchema;

/// Host-side access to one entity type, registered by type tag.
pub trait EntityRepository: Send + Sync {
    /// Schema the change set service and reconstructor work against.
    fn schema(&self) -> &EntitySchema;

    /// Current attributes of the live record, if it still exists.
    fn find(&self, id: &str) -> Option<Attributes>;
}
