//! Template management and generation endpoints.

pub mod handlers;
pub mod models;
pub mod upload;

pub use handlers::config;
