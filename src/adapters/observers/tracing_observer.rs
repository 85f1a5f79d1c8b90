use crate::core::errors::Result;
use crate::core::models::audit_record::AuditRecord;
use crate::core::traits::observer::AuditObserver;

/// Emits one structured event per persisted record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AuditObserver for TracingObserver {
    fn on_recorded(&self, record: &AuditRecord) -> Result<()> {
        let actor = record.actor.as_ref().map(ToString::to_string);
        let tenant = record.tenant.as_ref().map(ToString::to_string);
        tracing::info!(
            target: "revtrail::audit",
            entity = %record.entity,
            version = record.version,
            action = %record.action,
            actor = actor.as_deref().unwrap_or("-"),
            tenant = tenant.as_deref().unwrap_or("-"),
            changed = ?record.change_set.attribute_names().collect::<Vec<_>>(),
            "recorded"
        );
        Ok(())
    }
}
