//! platform-core: Shared infrastructure for the career-platform services.
pub mod error;
pub mod extract;
pub mod middleware;
pub mod observability;
