use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AnnouncementService, sees_everything};
use crate::middlewares::RequireJWT;
use crate::models::announcements::entities::Audience;
use crate::models::announcements::requests::AnnouncementListParams;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{storage_error_response, unauthorized};

pub async fn list_announcements(
    service: &AnnouncementService,
    mut query: AnnouncementListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(role) = RequireJWT::extract_user_role(request) else {
        return Ok(unauthorized());
    };

    // 教师只能看到已发布且面向自己的公告
    if !sees_everything(role) {
        query.filter.published = Some(true);
        query.filter.visible_audiences = Some(Audience::visible_to(role).to_vec());
    }

    let storage = service.get_storage(request);

    match storage.list_announcements_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Announcement list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to retrieve announcement list",
        )),
    }
}
