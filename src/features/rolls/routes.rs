use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::rolls::handlers;
use crate::features::rolls::services::RollService;

pub fn routes(service: Arc<RollService>) -> Router {
    Router::new()
        .route(
            "/api/batches/{id}/recalculate-rolls",
            post(handlers::recalculate_batch_rolls),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::features::directory::models::UserRole;
    use crate::features::directory::DirectoryService;
    use crate::shared::test_helpers::{with_user, InMemoryCampus};

    #[tokio::test]
    async fn test_recalculate_endpoint() {
        let campus = InMemoryCampus::new();
        let admin = campus.add_user("Admin", UserRole::Admin);
        let teacher = campus.add_user("Teacher", UserRole::Teacher);
        let course = campus.add_course("CSE");
        let batch = campus.add_batch(course, 2);
        campus.add_student("Bob", batch);
        campus.add_student("Alice", batch);

        let directory = Arc::new(DirectoryService::new(campus.clone()));
        let service = Arc::new(RollService::new(campus.clone(), directory));
        let path = format!("/api/batches/{}/recalculate-rolls", batch);

        let as_teacher = TestServer::new(with_user(routes(service.clone()), teacher)).unwrap();
        as_teacher
            .post(&path)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let as_admin = TestServer::new(with_user(routes(service), admin)).unwrap();
        let response = as_admin.post(&path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["total_students"], json!(2));
        assert_eq!(body["data"]["updated"], json!(2));
    }
}
