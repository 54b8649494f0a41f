//! Read-only access to the caller's generated documents.

pub mod handlers;

pub use handlers::config;
