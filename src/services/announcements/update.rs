use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AnnouncementService;
use super::create::{check_body, check_title};
use crate::models::announcements::requests::UpdateAnnouncementRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{not_found, storage_error_response};

/// 首次发布时记录 published_at，之后保持不变
pub async fn update_announcement(
    service: &AnnouncementService,
    id: i64,
    mut data: UpdateAnnouncementRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref title) = data.title {
        match check_title(title) {
            Ok(title) => data.title = Some(title),
            Err(resp) => return Ok(resp),
        }
    }
    if let Some(ref body) = data.body {
        match check_body(body) {
            Ok(body) => data.body = Some(body),
            Err(resp) => return Ok(resp),
        }
    }

    let storage = service.get_storage(request);

    match storage.update_announcement(id, data).await {
        Ok(Some(announcement)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            announcement,
            "Announcement updated successfully",
        ))),
        Ok(None) => Ok(not_found(
            ErrorCode::AnnouncementNotFound,
            "Announcement not found",
        )),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Announcement update failed",
        )),
    }
}
