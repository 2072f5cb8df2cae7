//! Roll-number recalculation for a batch.
//!
//! Students of a batch are numbered "1", "2", ... in ascending order of
//! their stored full name. Only rolls that change are written, all in one
//! transaction.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/batches/{id}/recalculate-rolls` | Renumber a batch (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgRosterRepository;
pub use services::RollService;
