use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notices::dtos::{
    CreateNoticeDto, ListNoticesQuery, NoticeDetailDto, NoticeResponseDto, ReadStatusDto,
    UnreadCountDto, UpdateNoticeDto,
};
use crate::features::notices::services::NoticeService;
use crate::shared::types::{ApiResponse, Meta};

/// List notices visible to the caller
///
/// Expired notices are excluded. Pinned notices come first, newest first within each group.
#[utoipa::path(
    get,
    path = "/api/notices",
    params(ListNoticesQuery),
    responses(
        (status = 200, description = "Visible notices", body = ApiResponse<Vec<NoticeResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No campus profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn list_notices(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    Query(query): Query<ListNoticesQuery>,
) -> Result<Json<ApiResponse<Vec<NoticeResponseDto>>>> {
    let actor = service.actor(&user).await?;
    let notices = service.list_visible(&actor, query.student_id).await?;
    let meta = Meta::total(notices.len());

    Ok(Json(ApiResponse::success(Some(notices), None, Some(meta))))
}

/// Count visible notices the caller has not read
#[utoipa::path(
    get,
    path = "/api/notices/unread-count",
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCountDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn unread_count(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
) -> Result<Json<ApiResponse<UnreadCountDto>>> {
    let actor = service.actor(&user).await?;
    let count = service.count_unread(&actor).await?;

    Ok(Json(ApiResponse::success(Some(count), None, None)))
}

/// Create a notice
///
/// `created_by` defaults to the caller. Teachers may target only the batches
/// and courses they are assigned to; students cannot create notices.
#[utoipa::path(
    post,
    path = "/api/notices",
    request_body = CreateNoticeDto,
    responses(
        (status = 201, description = "Notice created", body = ApiResponse<NoticeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not allowed to publish to this audience"),
        (status = 404, description = "Author not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn create_notice(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppJson(mut dto): AppJson<CreateNoticeDto>,
) -> Result<(StatusCode, Json<ApiResponse<NoticeResponseDto>>)> {
    let actor = service.actor(&user).await?;
    dto.created_by = dto.created_by.or(Some(actor.user_id));

    let notice = service.create(&actor, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(notice),
            Some("Notice created".to_string()),
            None,
        )),
    ))
}

/// Get a notice with the caller's read state
///
/// The notice's creator and admins also receive the list of readers.
#[utoipa::path(
    get,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Notice found", body = ApiResponse<NoticeDetailDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn get_notice(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<NoticeDetailDto>>> {
    let actor = service.actor(&user).await?;
    let notice = service.get_notice(&actor, id).await?;

    Ok(Json(ApiResponse::success(Some(notice), None, None)))
}

/// Update a notice
///
/// Only provided fields change. Restricted to the notice's creator and admins.
#[utoipa::path(
    put,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    request_body = UpdateNoticeDto,
    responses(
        (status = 200, description = "Notice updated", body = ApiResponse<NoticeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn update_notice(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateNoticeDto>,
) -> Result<Json<ApiResponse<NoticeResponseDto>>> {
    let actor = service.actor(&user).await?;
    let notice = service.update(&actor, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(notice),
        Some("Notice updated".to_string()),
        None,
    )))
}

/// Delete a notice and its read records
#[utoipa::path(
    delete,
    path = "/api/notices/{id}",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Notice deleted"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn delete_notice(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    let actor = service.actor(&user).await?;
    service.delete(&actor, id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Notice deleted".to_string()),
        None,
    )))
}

/// Mark a notice as read by the caller
#[utoipa::path(
    post,
    path = "/api/notices/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Marked as read", body = ApiResponse<ReadStatusDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Notice not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn mark_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ReadStatusDto>>> {
    let actor = service.actor(&user).await?;
    let read = service.mark_read(id, actor.user_id).await?;

    Ok(Json(ApiResponse::success(Some(read), None, None)))
}

/// Mark a notice as unread by the caller
#[utoipa::path(
    delete,
    path = "/api/notices/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Marked as unread"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "notices"
)]
pub async fn unmark_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NoticeService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    let actor = service.actor(&user).await?;
    service.unmark_read(id, actor.user_id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Marked as unread".to_string()),
        None,
    )))
}
