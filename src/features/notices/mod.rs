//! Notice (announcement) distribution.
//!
//! Audience targeting by role and academic affiliation, per-user read
//! tracking, and the authorship rules for creating and editing notices.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/notices` | Notices visible to the caller, with read state |
//! | GET | `/api/notices/unread-count` | Number of visible unread notices |
//! | POST | `/api/notices` | Create a notice (admin, teacher) |
//! | GET | `/api/notices/{id}` | Notice detail, with reader receipts for owner/admin |
//! | PUT | `/api/notices/{id}` | Partially update a notice (owner, admin) |
//! | DELETE | `/api/notices/{id}` | Delete a notice and its read records (owner, admin) |
//! | POST | `/api/notices/{id}/read` | Mark as read |
//! | DELETE | `/api/notices/{id}/read` | Mark as unread |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgNoticeRepository;
pub use services::NoticeService;
