use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeacherService;
use super::create::{NAME_MAX_CHARS, check_email, check_optional_fields, check_user_link};
use crate::models::{ApiResponse, ErrorCode, teachers::requests::UpdateTeacherRequest};
use crate::services::{bad_request, invalidate_dashboard, not_found, storage_error_response};
use crate::utils::validate::{normalize_optional, validate_required_text};

pub async fn update_teacher(
    service: &TeacherService,
    teacher_id: i64,
    mut update_data: UpdateTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref name) = update_data.name {
        if let Err(msg) = validate_required_text("name", name, NAME_MAX_CHARS) {
            return Ok(bad_request(ErrorCode::ValidationFailed, msg));
        }
        update_data.name = Some(name.trim().to_string());
    }
    update_data.email = update_data.email.map(|e| e.trim().to_lowercase());
    update_data.phone = update_data.phone.map(normalize_optional);
    update_data.subject = update_data.subject.map(normalize_optional);
    update_data.hired_on = update_data.hired_on.map(normalize_optional);

    if let Err(resp) = check_optional_fields(
        update_data.phone.as_ref().and_then(|p| p.as_deref()),
        update_data.hired_on.as_ref().and_then(|h| h.as_deref()),
    ) {
        return Ok(resp);
    }

    let storage = service.get_storage(request);

    if let Some(ref email) = update_data.email
        && let Err(resp) = check_email(&storage, email, Some(teacher_id)).await
    {
        return Ok(resp);
    }
    if let Some(Some(user_id)) = update_data.user_id
        && let Err(resp) = check_user_link(&storage, user_id).await
    {
        return Ok(resp);
    }

    match storage.update_teacher(teacher_id, update_data).await {
        Ok(Some(teacher)) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                teacher,
                "Teacher updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::TeacherNotFound, "Teacher not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Teacher update failed",
        )),
    }
}
