use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::directory::models::{UserRole, UserSummary};
use crate::features::notices::{dtos as notices_dtos, handlers as notices_handlers, models as notices_models};
use crate::features::rolls::{dtos as rolls_dtos, handlers as rolls_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Notices
        notices_handlers::list_notices,
        notices_handlers::unread_count,
        notices_handlers::create_notice,
        notices_handlers::get_notice,
        notices_handlers::update_notice,
        notices_handlers::delete_notice,
        notices_handlers::mark_read,
        notices_handlers::unmark_read,
        // Rolls
        rolls_handlers::recalculate_batch_rolls,
    ),
    components(
        schemas(
            // Shared
            Meta,
            UserRole,
            UserSummary,
            // Notices
            notices_models::TargetType,
            notices_dtos::CreateNoticeDto,
            notices_dtos::UpdateNoticeDto,
            notices_dtos::NoticeResponseDto,
            notices_dtos::NoticeDetailDto,
            notices_dtos::ReadReceiptDto,
            notices_dtos::ReadStatusDto,
            notices_dtos::UnreadCountDto,
            ApiResponse<Vec<notices_dtos::NoticeResponseDto>>,
            ApiResponse<notices_dtos::NoticeResponseDto>,
            ApiResponse<notices_dtos::NoticeDetailDto>,
            // Rolls
            rolls_dtos::RollRecalculationDto,
            ApiResponse<rolls_dtos::RollRecalculationDto>,
        )
    ),
    tags(
        (name = "notices", description = "Notice distribution and read tracking"),
        (name = "rolls", description = "Batch roll-number maintenance (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Campus Notices API",
        version = "0.1.0",
        description = "Notice targeting, read tracking and roll numbers for the campus portal",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token issued by the hosted auth service"))
                        .build(),
                ),
            );
        }
    }
}

/// Overrides OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
