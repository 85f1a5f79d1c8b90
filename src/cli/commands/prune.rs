use crate::cli::commands::audit_helpers::open_auditor;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::reference::EntityRef;
use crate::core::traits::store::AuditStore;

/// Execute the `revtrail prune` command.
///
/// Removes one record from the log. Reconstruction keeps working across
/// the gap this leaves.
pub fn execute(entity_type: &str, entity_id: &str, version: u32) -> Result<()> {
    let dir = context::require_initialized()?;
    let auditor = open_auditor(dir)?;
    let entity = EntityRef::new(entity_type, entity_id);

    if auditor.store().remove(&entity, version)? {
        output::success(&format!("Removed version {version} of {entity}"));
    } else {
        output::warning(&format!("{entity} has no version {version}"));
    }
    Ok(())
}
