use crate::core::errors::Result;
use crate::core::models::reference::{EntityRef, Party};

/// Secondary source for who acted when no ambient actor is active,
/// e.g. the owner of the entity's tenant.
pub trait ActorFallback: Send + Sync {
    fn actor_for(&self, entity: &EntityRef) -> Result<Option<Party>>;

    /// The tenant that owns `entity`, if the host tracks one.
    fn tenant_for(&self, entity: &EntityRef) -> Result<Option<Party>>;
}
