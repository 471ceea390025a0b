use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AnnouncementService, can_view};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{not_found, storage_error_response};

pub async fn get_announcement(
    service: &AnnouncementService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_announcement_by_id(id).await {
        // 对无权查看的用户表现为不存在
        Ok(Some(announcement)) if can_view(&announcement, request) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(
                announcement,
                "Announcement retrieved successfully",
            ))),
        Ok(_) => Ok(not_found(
            ErrorCode::AnnouncementNotFound,
            "Announcement not found",
        )),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to get announcement",
        )),
    }
}
