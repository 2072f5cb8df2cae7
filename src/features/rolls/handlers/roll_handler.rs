use std::sync::Arc;

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppPath;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::rolls::dtos::RollRecalculationDto;
use crate::features::rolls::services::RollService;
use crate::shared::types::ApiResponse;

/// Recalculate roll numbers of a batch
///
/// Renumbers students "1", "2", ... in ascending full-name order. Admin only.
#[utoipa::path(
    post,
    path = "/api/batches/{id}/recalculate-rolls",
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Rolls recalculated", body = ApiResponse<RollRecalculationDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Batch not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "rolls"
)]
pub async fn recalculate_batch_rolls(
    user: AuthenticatedUser,
    State(service): State<Arc<RollService>>,
    AppPath(batch_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<RollRecalculationDto>>> {
    let actor = service.actor(&user).await?;
    let summary = service.recalculate_batch_rolls(&actor, batch_id).await?;

    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("Roll numbers recalculated".to_string()),
        None,
    )))
}
