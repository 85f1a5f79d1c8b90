use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::cli::commands::audit_helpers::open_auditor;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::reference::EntityRef;
use crate::core::services::auditor::RevisionTarget;

/// Execute the `revtrail revision` command.
///
/// Rebuilds the entity at a version, a point in time, or a number of
/// steps back from its newest version, and prints the attribute map.
pub fn execute(
    entity_type: &str,
    entity_id: &str,
    version: Option<u32>,
    at: Option<&str>,
    previous: Option<u32>,
) -> Result<()> {
    let dir = context::require_initialized()?;
    let auditor = open_auditor(dir)?;
    let entity = EntityRef::new(entity_type, entity_id);

    let target = match (version, at, previous) {
        (Some(v), _, _) => RevisionTarget::Version(v),
        (None, Some(at), _) => RevisionTarget::At(parse_at(at)?),
        (None, None, Some(steps)) => RevisionTarget::FromEnd(steps),
        (None, None, None) => RevisionTarget::FromEnd(0),
    };

    match auditor.revision(&entity, target)? {
        Some(revision) => {
            output::header(&format!("{entity} @ version {}", revision.version));
            output::json(&revision.to_map());
        }
        None => {
            output::header(&entity.to_string());
            output::warning("No revision found for that point in history");
        }
    }
    Ok(())
}

/// Execute the `revtrail revisions` command.
pub fn execute_all(entity_type: &str, entity_id: &str, from: Option<u32>) -> Result<()> {
    let dir = context::require_initialized()?;
    let auditor = open_auditor(dir)?;
    let entity = EntityRef::new(entity_type, entity_id);

    let revisions = auditor.revisions(&entity, from)?;
    if revisions.is_empty() {
        output::header(&entity.to_string());
        output::warning("No revisions recorded");
        return Ok(());
    }

    output::header(&format!("{entity} ({} revisions)", revisions.len()));
    for revision in &revisions {
        println!("\n  {}", format!("version {}", revision.version).bold());
        output::json(&revision.attributes);
    }
    Ok(())
}

fn parse_at(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| RevtrailError::InvalidArgument {
            detail: format!("Invalid time: '{s}'. Expected RFC 3339, e.g. 2026-01-15T09:30:00Z"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_at_normalizes_to_utc() {
        let at = parse_at("2026-01-15T11:30:00+02:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-01-15T09:30:00+00:00");
        assert!(parse_at("yesterday").is_err());
    }
}
