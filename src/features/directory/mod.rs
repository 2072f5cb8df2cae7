//! Read-only view of the campus directory owned by the hosted profile service.
//!
//! Provides the acting user's role and the student/teacher affiliations used
//! to resolve notice audiences. Nothing here writes to the directory tables.

pub mod models;
pub mod repositories;
pub mod services;

pub use repositories::PgDirectoryRepository;
pub use services::DirectoryService;
