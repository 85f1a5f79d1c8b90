use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::repositories::memory_repository::MemoryRepository;
use crate::core::errors::{Result, RevtrailError};
use crate::core::models::reference::Party;
use crate::core::models::schema::{AttributeType, EntitySchema};
use crate::core::services::auditor::AuditPolicy;
use crate::core::services::change_set_service::{ChangeSetService, DEFAULT_EXCLUDED};
use crate::core::services::registry::EntityRegistry;
use crate::core::services::version_assigner::{DEFAULT_MAX_ATTEMPTS, VersionAssigner};

/// Top-level configuration read from `.revtrail/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub revtrail: RevtrailSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditSection>,
    #[serde(default)]
    pub entities: HashMap<String, EntityEntry>,
}

impl AppConfig {
    /// Load the configuration from `{dir}/config.toml`.
    ///
    /// Rejects stores written by a newer format and log file names that
    /// could escape the store directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            return Err(RevtrailError::InvalidConfig {
                detail: "config.toml not found. Run 'revtrail init' first.".into(),
            });
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| RevtrailError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;

        if config.revtrail.format_version > CURRENT_FORMAT_VERSION {
            return Err(RevtrailError::FormatVersionTooNew {
                project_version: config.revtrail.format_version,
                supported_version: CURRENT_FORMAT_VERSION,
            });
        }

        if let Some(audit) = &config.audit {
            validate_simple_filename(&audit.log_file, "audit log file")?;
        }

        Ok(config)
    }

    /// A fresh configuration as written by `revtrail init`.
    pub fn initial() -> Self {
        Self {
            revtrail: RevtrailSection {
                version: env!("CARGO_PKG_VERSION").to_string(),
                format_version: CURRENT_FORMAT_VERSION,
            },
            audit: Some(AuditSection::default()),
            entities: HashMap::new(),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RevtrailError::InvalidConfig {
            detail: format!("Failed to serialize config: {e}"),
        })
    }

    /// The `[audit]` section, or its defaults when absent.
    pub fn audit_section(&self) -> AuditSection {
        self.audit.clone().unwrap_or_default()
    }

    pub fn policy(&self) -> AuditPolicy {
        let audit = self.audit_section();
        AuditPolicy {
            enabled: audit.enabled,
            blocking: audit.blocking,
        }
    }

    pub fn change_set_service(&self) -> ChangeSetService {
        ChangeSetService::new(self.audit_section().excluded_attributes)
    }

    pub fn version_assigner(&self) -> VersionAssigner {
        VersionAssigner::new(self.audit_section().max_version_retries)
    }

    pub fn default_actor(&self) -> Option<Party> {
        self.audit_section().default_actor.as_deref().map(Party::parse)
    }

    /// Schemas for every `[entities.<Type>]` table.
    pub fn schemas(&self) -> Vec<EntitySchema> {
        self.entities
            .iter()
            .map(|(name, entry)| EntitySchema {
                entity_type: name.clone(),
                attributes: entry.attributes.clone(),
                excluded: entry.excluded.iter().cloned().collect(),
            })
            .collect()
    }

    /// A registry holding a schema-only repository per declared type.
    pub fn registry(&self) -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        for schema in self.schemas() {
            registry.register(Arc::new(MemoryRepository::new(schema)));
        }
        registry
    }
}

/// Current format version supported by this build.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// The `[revtrail]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevtrailSection {
    pub version: String,
    /// Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

fn default_format_version() -> u32 {
    1
}

/// The `[audit]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub enabled: bool,
    pub log_file: String,
    /// Fail the triggering mutation when the audit write fails.
    pub blocking: bool,
    pub max_version_retries: u32,
    pub excluded_attributes: Vec<String>,
    /// Actor recorded when neither the caller nor the context names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_actor: Option<String>,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: "audit.log".to_string(),
            blocking: false,
            max_version_retries: DEFAULT_MAX_ATTEMPTS,
            excluded_attributes: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            default_actor: None,
        }
    }
}

/// One `[entities.<Type>]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityEntry {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeType>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

/// Validate a file name that must stay inside the store directory.
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(RevtrailError::InvalidConfig {
            detail: format!("Invalid {what} '{name}': must be a plain file name"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[revtrail]
version = "0.1.0"

[audit]
log_file = "history.log"
blocking = true
excluded_attributes = ["password"]
default_actor = "system"

[entities.User]
attributes = { name = "text", logins = "integer", activated = "boolean" }
excluded = ["secret_token"]
"#;

    #[test]
    fn parses_full_config() {
        let config = AppConfig::parse(SAMPLE).unwrap();
        let audit = config.audit_section();

        assert_eq!(audit.log_file, "history.log");
        assert!(audit.enabled);
        assert_eq!(audit.max_version_retries, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.policy(), AuditPolicy { enabled: true, blocking: true });
        assert_eq!(config.default_actor(), Some(Party::name("system")));

        let schemas = config.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].attributes["logins"], AttributeType::Integer);
        assert!(schemas[0].excluded.contains("secret_token"));
        assert!(config.registry().is_registered("User"));
    }

    #[test]
    fn missing_audit_section_uses_defaults() {
        let config = AppConfig::parse("[revtrail]\nversion = \"0.1.0\"\n").unwrap();
        assert_eq!(config.audit_section(), AuditSection::default());
        assert_eq!(config.policy(), AuditPolicy::default());
        assert!(config.entities.is_empty());
    }

    #[test]
    fn rejects_newer_format() {
        let err =
            AppConfig::parse("[revtrail]\nversion = \"9\"\nformat_version = 2\n").unwrap_err();
        assert!(matches!(err, RevtrailError::FormatVersionTooNew { .. }));
    }

    #[test]
    fn rejects_log_file_with_path() {
        let err = AppConfig::parse(
            "[revtrail]\nversion = \"0.1.0\"\n[audit]\nlog_file = \"../escape.log\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, RevtrailError::InvalidConfig { .. }));
    }

    #[test]
    fn initial_config_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let text = AppConfig::initial().to_toml().unwrap();
        std::fs::write(tmp.path().join("config.toml"), text).unwrap();

        let loaded = AppConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.revtrail.format_version, CURRENT_FORMAT_VERSION);
        assert_eq!(loaded.audit_section(), AuditSection::default());
    }

    #[test]
    fn load_without_file_points_to_init() {
        let tmp = TempDir::new().unwrap();
        let err = AppConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("revtrail init"));
    }
}
