use chrono::Utc;

use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::{AuditRecord, PendingRecord};
use crate::core::traits::store::{AuditStore, InsertOutcome};

/// Default bound on optimistic retries before a race is surfaced.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Assigns `max(existing) + 1` and persists in one conditional insert,
/// retrying with a fresh maximum when another writer got there first.
pub struct VersionAssigner {
    max_attempts: u32,
}

impl Default for VersionAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl VersionAssigner {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Version and persist `pending`.
    ///
    /// `created_at` is never earlier than the previous record's, so time
    /// lookups agree with version order even under clock skew between
    /// writers.
    ///
    /// # Errors
    ///
    /// `VersionConflict` when every attempt lost the race; any storage
    /// error is propagated unchanged.
    pub fn assign(&self, store: &dyn AuditStore, pending: PendingRecord) -> Result<AuditRecord> {
        for attempt in 1..=self.max_attempts {
            let previous = store.records(&pending.entity, None)?.pop();
            let version = previous.as_ref().map_or(0, |r| r.version) + 1;
            // never stamp a record earlier than the one it follows
            let now = Utc::now();
            let created_at = previous.map_or(now, |r| r.created_at.max(now));
            let record = pending.clone().into_record(version, created_at);

            match store.insert_next(&record)? {
                InsertOutcome::Inserted => return Ok(record),
                InsertOutcome::Conflict => {
                    tracing::debug!(
                        entity = %pending.entity,
                        version,
                        attempt,
                        "version taken by a concurrent writer, retrying"
                    );
                    std::thread::yield_now();
                }
            }
        }

        Err(RevtrailError::VersionConflict {
            entity: pending.entity.to_string(),
            attempts: self.max_attempts,
        })
    }
}
