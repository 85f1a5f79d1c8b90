use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::errors::{Result, RevtrailError};
use crate::core::models::audit_record::{AuditAction, AuditRecord, PendingRecord};
use crate::core::models::change_set::Attributes;
use crate::core::models::reference::{EntityRef, Party};
use crate::core::models::revision::Revision;
use crate::core::services::actor_context;
use crate::core::services::change_set_service::ChangeSetService;
use crate::core::services::party_resolver::PartyResolver;
use crate::core::services::reconstructor::Reconstructor;
use crate::core::services::registry::EntityRegistry;
use crate::core::services::version_assigner::VersionAssigner;
use crate::core::traits::observer::AuditObserver;
use crate::core::traits::store::{AuditFilter, AuditStore};

/// Whether audit writes happen at all, and whether a failed write
/// should fail the entity mutation that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditPolicy {
    pub enabled: bool,
    pub blocking: bool,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            blocking: false,
        }
    }
}

/// One lifecycle event as reported by the host's save/delete hook.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub entity: EntityRef,
    pub action: AuditAction,
    pub before: Attributes,
    pub after: Attributes,
    pub actor: Option<Party>,
    pub tenant: Option<Party>,
}

impl ChangeEvent {
    pub fn new(
        entity: EntityRef,
        action: AuditAction,
        before: Attributes,
        after: Attributes,
    ) -> Self {
        Self {
            entity,
            action,
            before,
            after,
            actor: None,
            tenant: None,
        }
    }

    pub fn created(entity: EntityRef, attributes: Attributes) -> Self {
        Self::new(entity, AuditAction::Create, Attributes::new(), attributes)
    }

    pub fn updated(entity: EntityRef, before: Attributes, after: Attributes) -> Self {
        Self::new(entity, AuditAction::Update, before, after)
    }

    pub fn destroyed(entity: EntityRef, last_state: Attributes) -> Self {
        Self::new(entity, AuditAction::Destroy, last_state, Attributes::new())
    }

    /// Record `actor` explicitly instead of consulting the ambient context.
    pub fn by(mut self, actor: Party) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn for_tenant(mut self, tenant: Party) -> Self {
        self.tenant = Some(tenant);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Update whose diff came out empty.
    NoChanges,
    /// Inside a `without_auditing` scope.
    Suppressed,
    /// Auditing is switched off by configuration.
    Disabled,
}

/// What happened to one lifecycle event.
#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(AuditRecord),
    Skipped(SkipReason),
    /// Persisting failed under a non-blocking policy. The entity write
    /// should go ahead; the history has a hole.
    Failed(RevtrailError),
}

impl RecordOutcome {
    pub fn record(&self) -> Option<&AuditRecord> {
        match self {
            RecordOutcome::Recorded(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecordOutcome::Skipped(_))
    }
}

/// Which point in an entity's history to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionTarget {
    Version(u32),
    At(DateTime<Utc>),
    /// Steps back from the newest version; `1` is the previous revision.
    FromEnd(u32),
}

/// The audit engine: diffs lifecycle events, versions and persists them,
/// and rebuilds historical state.
pub struct Auditor<S: AuditStore> {
    store: S,
    registry: EntityRegistry,
    changes: ChangeSetService,
    versions: VersionAssigner,
    parties: PartyResolver,
    observers: Vec<Arc<dyn AuditObserver>>,
    policy: AuditPolicy,
}

impl<S: AuditStore> Auditor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: EntityRegistry::new(),
            changes: ChangeSetService::default(),
            versions: VersionAssigner::default(),
            parties: PartyResolver::default(),
            observers: Vec::new(),
            policy: AuditPolicy::default(),
        }
    }

    pub fn with_registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_change_sets(mut self, changes: ChangeSetService) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_versions(mut self, versions: VersionAssigner) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_parties(mut self, parties: PartyResolver) -> Self {
        self.parties = parties;
        self
    }

    pub fn with_policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AuditObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Record one lifecycle event using the ambient actor and tenant.
    pub fn record_change(
        &self,
        entity: EntityRef,
        action: AuditAction,
        before: Attributes,
        after: Attributes,
    ) -> Result<RecordOutcome> {
        self.record(ChangeEvent::new(entity, action, before, after))
    }

    /// Diff, resolve parties, version and persist `event`.
    ///
    /// # Errors
    ///
    /// Only under a blocking policy: the storage error or an exhausted
    /// version race. Otherwise failures come back as
    /// [`RecordOutcome::Failed`].
    pub fn record(&self, event: ChangeEvent) -> Result<RecordOutcome> {
        if !self.policy.enabled {
            return Ok(RecordOutcome::Skipped(SkipReason::Disabled));
        }
        if actor_context::auditing_suppressed() {
            return Ok(RecordOutcome::Skipped(SkipReason::Suppressed));
        }

        let schema = self.registry.schema(&event.entity.entity_type);
        let change_set = self
            .changes
            .compute(&schema, event.action, &event.before, &event.after);
        if change_set.is_empty() && event.action == AuditAction::Update {
            tracing::debug!(entity = %event.entity, "update changed nothing, skipping");
            return Ok(RecordOutcome::Skipped(SkipReason::NoChanges));
        }

        let pending = PendingRecord {
            actor: self.parties.resolve_actor(event.actor, &event.entity),
            tenant: self.parties.resolve_tenant(event.tenant, &event.entity),
            entity: event.entity,
            action: event.action,
            change_set,
        };

        match self.versions.assign(&self.store, pending) {
            Ok(record) => {
                tracing::info!(
                    entity = %record.entity,
                    version = record.version,
                    action = %record.action,
                    attributes = record.change_set.len(),
                    "audit record persisted"
                );
                self.notify(&record);
                Ok(RecordOutcome::Recorded(record))
            }
            Err(e) if self.policy.blocking => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "audit record lost, entity write not blocked");
                Ok(RecordOutcome::Failed(e))
            }
        }
    }

    fn notify(&self, record: &AuditRecord) {
        for observer in &self.observers {
            if let Err(e) = observer.on_recorded(record) {
                tracing::warn!(
                    entity = %record.entity,
                    version = record.version,
                    error = %e,
                    "post-record observer failed"
                );
            }
        }
    }

    /// Every surviving record for `entity`, oldest version first.
    pub fn history(&self, entity: &EntityRef) -> Result<Vec<AuditRecord>> {
        self.store.records(entity, None)
    }

    /// Records across all entities matching `filter`.
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>> {
        self.store.query(filter)
    }

    fn reconstructor(&self) -> Reconstructor<'_> {
        Reconstructor::new(&self.store, &self.registry)
    }

    pub fn reconstruct(&self, entity: &EntityRef, version: u32) -> Result<Option<Revision>> {
        self.reconstructor().reconstruct(entity, version)
    }

    pub fn revision_at(&self, entity: &EntityRef, at: DateTime<Utc>) -> Result<Option<Revision>> {
        self.reconstructor().revision_at(entity, at)
    }

    pub fn previous_revision(&self, entity: &EntityRef) -> Result<Option<Revision>> {
        self.reconstructor().relative(entity, 1)
    }

    pub fn revision(&self, entity: &EntityRef, target: RevisionTarget) -> Result<Option<Revision>> {
        let reconstructor = self.reconstructor();
        match target {
            RevisionTarget::Version(version) => reconstructor.reconstruct(entity, version),
            RevisionTarget::At(at) => reconstructor.revision_at(entity, at),
            RevisionTarget::FromEnd(offset) => reconstructor.relative(entity, offset),
        }
    }

    pub fn revisions(
        &self,
        entity: &EntityRef,
        from_version: Option<u32>,
    ) -> Result<Vec<Revision>> {
        self.reconstructor().revisions(entity, from_version)
    }

    /// Current attributes of the live entity, via its registered repository.
    pub fn live_attributes(&self, entity: &EntityRef) -> Result<Option<Attributes>> {
        self.registry.live(entity)
    }
}
