/// All domain errors for revtrail.
///
/// Only storage outages and exhausted version races are hard failures.
/// No-op updates, missing actors and malformed history entries are
/// handled in-band and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum RevtrailError {
    #[error(
        "Version conflict on {entity}: gave up after {attempts} attempts\n\n  \
         Another writer kept claiming the next version of this entity.\n  \
         The operation is safe to retry."
    )]
    VersionConflict { entity: String, attempts: u32 },

    #[error(
        "Audit storage unavailable: {detail}\n\n  \
         Check that the log directory exists and is writable.\n  \
         Run 'revtrail init' to create a fresh store."
    )]
    StorageUnavailable { detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "Unknown entity type '{entity_type}'\n\n  \
         Declare it under [entities.{entity_type}] in .revtrail/config.toml."
    )]
    UnknownEntityType { entity_type: String },

    #[error(
        "Invalid attributes: {detail}\n\n  \
         Expected a JSON object, e.g. '{{\"name\": \"Brandon\"}}'."
    )]
    InvalidAttributes { detail: String },

    #[error("Invalid argument: {detail}")]
    InvalidArgument { detail: String },

    #[error(
        "This store uses format version {project_version}, but this build of revtrail \
         only supports up to version {supported_version}.\n\n  \
         Upgrade revtrail before touching this audit log."
    )]
    FormatVersionTooNew {
        project_version: u32,
        supported_version: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RevtrailError {
    /// True for failures that come from the storage layer rather than
    /// from the caller's input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            RevtrailError::StorageUnavailable { .. }
                | RevtrailError::VersionConflict { .. }
                | RevtrailError::Io(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RevtrailError>;
