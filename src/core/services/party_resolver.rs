use std::sync::Arc;

use crate::core::errors::Result;
use crate::core::models::reference::{EntityRef, Party};
use crate::core::services::actor_context;
use crate::core::traits::fallback::ActorFallback;

/// Resolves the actor and tenant of an audit record through a fixed
/// precedence chain. Resolution never fails: every stage that comes up
/// empty or errors is logged and the next one is tried, ending in `None`.
///
/// Actor: explicit > ambient `with_actor` > fallback collaborator >
/// configured default.
///
/// Tenant: explicit > ambient `with_tenant` > the entity's own tenant as
/// reported by the fallback collaborator.
#[derive(Default, Clone)]
pub struct PartyResolver {
    fallback: Option<Arc<dyn ActorFallback>>,
    default_actor: Option<Party>,
}

impl PartyResolver {
    pub fn new(fallback: Option<Arc<dyn ActorFallback>>, default_actor: Option<Party>) -> Self {
        Self {
            fallback,
            default_actor,
        }
    }

    pub fn resolve_actor(&self, explicit: Option<Party>, entity: &EntityRef) -> Option<Party> {
        explicit
            .or_else(actor_context::current_actor)
            .or_else(|| self.ask_fallback("actor", entity, |f| f.actor_for(entity)))
            .or_else(|| self.default_actor.clone())
            .or_else(|| {
                tracing::debug!(entity = %entity, "no actor resolved, recording anonymously");
                None
            })
    }

    pub fn resolve_tenant(&self, explicit: Option<Party>, entity: &EntityRef) -> Option<Party> {
        explicit
            .or_else(actor_context::current_tenant)
            .or_else(|| self.ask_fallback("tenant", entity, |f| f.tenant_for(entity)))
    }

    fn ask_fallback(
        &self,
        role: &str,
        entity: &EntityRef,
        ask: impl FnOnce(&dyn ActorFallback) -> Result<Option<Party>>,
    ) -> Option<Party> {
        let fallback = self.fallback.as_deref()?;
        match ask(fallback) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(entity = %entity, role, error = %e, "fallback lookup failed");
                None
            }
        }
    }
}
