//! Attribute-level change tracking.
//!
//! Every create, update and destroy of a tracked record is diffed into an
//! append-only, per-entity versioned log, along with who made the change
//! and on whose behalf. Any historical state can be rebuilt by replaying
//! the log up to a version or a point in time.
//!
//! [`core::services::auditor::Auditor`] is the entry point. Storage, live
//! entity lookup and actor fallback are ports under [`core::traits`], with
//! file and in-memory implementations under [`adapters`].

pub mod adapters;
pub mod config;
pub mod core;

pub use crate::core::errors::{Result, RevtrailError};
pub use crate::core::models::audit_record::{AuditAction, AuditRecord};
pub use crate::core::models::change_set::{Attributes, Change, ChangeSet};
pub use crate::core::models::reference::{EntityRef, Party};
pub use crate::core::models::revision::Revision;
pub use crate::core::services::actor_context::{
    current_actor, current_tenant, with_actor, with_tenant, without_auditing,
};
pub use crate::core::services::auditor::{
    AuditPolicy, Auditor, ChangeEvent, RecordOutcome, RevisionTarget, SkipReason,
};
