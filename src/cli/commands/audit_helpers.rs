use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use crate::adapters::observers::tracing_observer::TracingObserver;
use crate::adapters::stores::json_lines_store::JsonLinesAuditStore;
use crate::config::app_config::AppConfig;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::change_set::Attributes;
use crate::core::models::reference::{EntityRef, Party};
use crate::core::services::auditor::Auditor;
use crate::core::services::party_resolver::PartyResolver;
use crate::core::traits::fallback::ActorFallback;

/// Falls back to the local git identity when no actor was given.
pub struct GitAuthorFallback;

impl ActorFallback for GitAuthorFallback {
    fn actor_for(&self, _entity: &EntityRef) -> Result<Option<Party>> {
        Ok(git_author().map(Party::Name))
    }

    fn tenant_for(&self, _entity: &EntityRef) -> Result<Option<Party>> {
        Ok(None)
    }
}

/// Read the git user name from the local/global config.
/// Returns `None` if git is not available or the name is unset.
pub fn git_author() -> Option<String> {
    Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                let val = String::from_utf8_lossy(&o.stdout).trim().to_string();
                if val.is_empty() { None } else { Some(val) }
            } else {
                None
            }
        })
}

/// Build an auditor over the JSON-lines log configured in `dir`.
pub fn open_auditor(dir: &Path) -> Result<Auditor<JsonLinesAuditStore>> {
    let config = AppConfig::load(dir)?;
    let store = JsonLinesAuditStore::from_config(dir, config.audit.as_ref());

    let parties = PartyResolver::new(Some(Arc::new(GitAuthorFallback)), config.default_actor());

    Ok(Auditor::new(store)
        .with_registry(config.registry())
        .with_change_sets(config.change_set_service())
        .with_versions(config.version_assigner())
        .with_parties(parties)
        .with_policy(config.policy())
        .with_observer(Arc::new(TracingObserver)))
}

/// Parse a `--before` / `--after` argument into an attribute map.
pub fn parse_attributes(raw: Option<&str>) -> Result<Attributes> {
    let Some(raw) = raw else {
        return Ok(Attributes::new());
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(RevtrailError::InvalidAttributes {
            detail: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(RevtrailError::InvalidAttributes {
            detail: e.to_string(),
        }),
    }
}
