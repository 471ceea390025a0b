use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AnnouncementService;
use crate::middlewares::RequireJWT;
use crate::models::announcements::entities::TITLE_MAX_CHARS;
use crate::models::announcements::requests::CreateAnnouncementRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, storage_error_response};
use crate::utils::validate::validate_required_text;

pub(super) const BODY_MAX_CHARS: usize = 20_000;

pub(super) fn check_title(title: &str) -> Result<String, HttpResponse> {
    validate_required_text("title", title, TITLE_MAX_CHARS)
        .map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    Ok(title.trim().to_string())
}

pub(super) fn check_body(body: &str) -> Result<String, HttpResponse> {
    validate_required_text("body", body, BODY_MAX_CHARS)
        .map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    Ok(body.trim().to_string())
}

pub async fn create_announcement(
    service: &AnnouncementService,
    mut data: CreateAnnouncementRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match check_title(&data.title) {
        Ok(title) => data.title = title,
        Err(resp) => return Ok(resp),
    }
    match check_body(&data.body) {
        Ok(body) => data.body = body,
        Err(resp) => return Ok(resp),
    }

    let storage = service.get_storage(request);
    let author_id = RequireJWT::extract_user_id(request);

    match storage.create_announcement(data, author_id).await {
        Ok(announcement) => {
            info!(
                "Announcement {} created (published: {})",
                announcement.id, announcement.published
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                announcement,
                "Announcement created successfully",
            )))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Announcement creation failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_limits() {
        assert_eq!(check_title("  Reunião de pais ").unwrap(), "Reunião de pais");
        assert!(check_title("").is_err());
        // 按字符计数
        assert!(check_title(&"ç".repeat(TITLE_MAX_CHARS)).is_ok());
        assert!(check_title(&"ç".repeat(TITLE_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn test_body_required() {
        assert!(check_body(" \n ").is_err());
        assert!(check_body("Aula suspensa na sexta").is_ok());
    }
}
