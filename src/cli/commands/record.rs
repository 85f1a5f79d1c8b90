use crate::cli::commands::audit_helpers::{open_auditor, parse_attributes};
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::AuditAction;
use crate::core::models::reference::{EntityRef, Party};
use crate::core::services::auditor::{ChangeEvent, RecordOutcome, SkipReason};

/// Arguments of `revtrail record`, as parsed by clap.
pub struct RecordArgs<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
    pub action: &'a str,
    pub before: Option<&'a str>,
    pub after: Option<&'a str>,
    pub actor: Option<&'a str>,
    pub tenant: Option<&'a str>,
}

/// Execute the `revtrail record` command.
///
/// Diffs the given before/after states and appends a versioned record.
/// A failed write under a non-blocking policy is reported as a warning.
pub fn execute(args: RecordArgs<'_>) -> Result<()> {
    let dir = context::require_initialized()?;
    let auditor = open_auditor(dir)?;

    let action: AuditAction = args
        .action
        .parse()
        .map_err(|detail| RevtrailError::InvalidArgument { detail })?;
    let entity = EntityRef::new(args.entity_type, args.entity_id);

    let mut event = ChangeEvent::new(
        entity.clone(),
        action,
        parse_attributes(args.before)?,
        parse_attributes(args.after)?,
    );
    if let Some(actor) = args.actor {
        event = event.by(Party::parse(actor));
    }
    if let Some(tenant) = args.tenant {
        event = event.for_tenant(Party::parse(tenant));
    }

    match auditor.record(event)? {
        RecordOutcome::Recorded(record) => {
            output::success(&format!(
                "Recorded {} {} as version {}",
                record.action, record.entity, record.version
            ));
            let changed: Vec<&str> = record.change_set.attribute_names().collect();
            output::detail(&format!("changed: {}", changed.join(", ")));
            if let Some(actor) = &record.actor {
                output::detail(&format!("by: {actor}"));
            }
        }
        RecordOutcome::Skipped(SkipReason::NoChanges) => {
            output::warning(&format!("No changes detected for {entity}; nothing recorded"));
        }
        RecordOutcome::Skipped(SkipReason::Disabled) => {
            output::warning("Auditing is disabled in config.toml; nothing recorded");
        }
        RecordOutcome::Skipped(SkipReason::Suppressed) => {
            output::warning("Auditing is suppressed; nothing recorded");
        }
        RecordOutcome::Failed(e) => {
            output::warning(&format!("Could not write audit log: {e}"));
        }
    }

    Ok(())
}
