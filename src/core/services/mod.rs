pub mod actor_context;
pub mod auditor;
pub mod change_set_service;
pub mod party_resolver;
pub mod reconstructor;
pub mod registry;
pub mod version_assigner;
