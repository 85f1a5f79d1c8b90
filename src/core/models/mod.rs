pub mod audit_record;
pub mod change_set;
pub mod reference;
pub mod revision;
pub mod schema;
