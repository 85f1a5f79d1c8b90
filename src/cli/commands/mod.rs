pub mod audit_helpers;
pub mod init;
pub mod log;
pub mod prune;
pub mod record;
pub mod revision;
