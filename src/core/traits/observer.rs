use crate::core::errors::Result;
use crate::core::models::audit_record::AuditRecord;

/// Best-effort hook run after a record is persisted.
///
/// Errors are logged by the caller and never undo the record.
pub trait AuditObserver: Send + Sync {
    fn on_recorded(&self, record: &AuditRecord) -> Result<()>;
}
