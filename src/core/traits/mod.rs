pub mod fallback;
pub mod observer;
pub mod repository;
pub mod store;
