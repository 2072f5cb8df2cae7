use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::notices::handlers;
use crate::features::notices::services::NoticeService;

/// Create routes for the notices feature
///
/// Every route expects an `AuthenticatedUser` extension from the auth middleware.
pub fn routes(service: Arc<NoticeService>) -> Router {
    Router::new()
        .route(
            "/api/notices",
            get(handlers::list_notices).post(handlers::create_notice),
        )
        .route("/api/notices/unread-count", get(handlers::unread_count))
        .route(
            "/api/notices/{id}",
            get(handlers::get_notice)
                .put(handlers::update_notice)
                .delete(handlers::delete_notice),
        )
        .route(
            "/api/notices/{id}/read",
            post(handlers::mark_read).delete(handlers::unmark_read),
        )
        .with_state(service)
}
