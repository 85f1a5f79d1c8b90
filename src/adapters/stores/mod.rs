pub mod json_lines_store;
pub mod memory_store;
