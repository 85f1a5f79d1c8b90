use chrono::{NaiveDate, TimeZone, Utc};
use colored::Colorize;

use crate::cli::commands::audit_helpers::open_auditor;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::{AuditAction, AuditRecord};
use crate::core::models::reference::EntityRef;
use crate::core::traits::store::AuditFilter;

/// Filters of `revtrail log`, as parsed by clap.
pub struct LogArgs<'a> {
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<&'a str>,
    pub actor: Option<&'a str>,
    pub tenant: Option<&'a str>,
    pub since: Option<&'a str>,
    pub last: Option<usize>,
}

/// Execute the `revtrail log` command.
///
/// Displays the audit log with optional filters for entity, actor,
/// tenant, date, and entry count.
pub fn execute(args: LogArgs<'_>) -> Result<()> {
    let dir = context::require_initialized()?;
    let auditor = open_auditor(dir)?;

    let since = args.since.map(parse_since).transpose()?;
    let filter = AuditFilter {
        since,
        actor: args.actor.map(str::to_string),
        tenant: args.tenant.map(str::to_string),
        entity: None,
    };

    let entries: Vec<AuditRecord> = match (args.entity_type, args.entity_id) {
        (Some(kind), Some(id)) => auditor
            .history(&EntityRef::new(kind, id))?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect(),
        (Some(kind), None) => auditor
            .query(&filter)?
            .into_iter()
            .filter(|r| r.entity.entity_type == kind)
            .collect(),
        _ => auditor.query(&filter)?,
    };

    if entries.is_empty() {
        output::header("revtrail log");
        output::warning("No audit entries found");
        if args.actor.is_some() || args.tenant.is_some() || args.since.is_some() {
            println!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    // Apply --last N (take from the end)
    let skip = args
        .last
        .map_or(0, |n| entries.len().saturating_sub(n));
    let display = &entries[skip..];

    output::header(&format!("revtrail log ({} entries)", display.len()));
    println!();

    for entry in display {
        print_entry(entry);
    }

    Ok(())
}

/// Parse a date string (ISO 8601: `YYYY-MM-DD`) into a UTC DateTime.
fn parse_since(s: &str) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Utc.from_utc_datetime(&d))
        .ok_or_else(|| RevtrailError::InvalidArgument {
            detail: format!(
                "Invalid date format: '{s}'. Expected ISO 8601 (YYYY-MM-DD), e.g. 2026-01-15"
            ),
        })
}

/// Print a single audit record as a formatted row.
fn print_entry(entry: &AuditRecord) {
    let date = entry.created_at.format("%Y-%m-%d %H:%M:%S");
    let action = format_action(entry.action);
    let actor = entry
        .actor
        .as_ref()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "—".to_string());
    let changed: Vec<&str> = entry.change_set.attribute_names().collect();

    println!(
        "  {} {} {:<8} {} v{} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        action,
        entry.entity,
        entry.version,
        actor.cyan(),
        changed.join(", ").dimmed(),
    );
}

/// Format an AuditAction as a colored string.
fn format_action(action: AuditAction) -> String {
    match action {
        AuditAction::Create => "create".green().to_string(),
        AuditAction::Update => "update".yellow().to_string(),
        AuditAction::Destroy => "destroy".red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_since_accepts_iso_dates() {
        let dt = parse_since("2026-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn parse_since_rejects_garbage() {
        assert!(matches!(
            parse_since("15/01/2026"),
            Err(RevtrailError::InvalidArgument { .. })
        ));
    }
}
