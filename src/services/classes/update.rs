use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use super::create::{NAME_MAX_CHARS, check_capacity, check_name, check_school_year, check_teacher};
use crate::models::classes::requests::UpdateClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, conflict, invalidate_dashboard, not_found, storage_error_response,
};
use crate::utils::validate::{normalize_optional, validate_required_text};

pub async fn update_class(
    service: &ClassService,
    class_id: i64,
    mut update_data: UpdateClassRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref name) = update_data.name {
        if let Err(msg) = validate_required_text("name", name, NAME_MAX_CHARS) {
            return Ok(bad_request(ErrorCode::ValidationFailed, msg));
        }
        update_data.name = Some(name.trim().to_string());
    }
    if let Some(ref grade_level) = update_data.grade_level {
        if let Err(msg) = validate_required_text("grade_level", grade_level, NAME_MAX_CHARS) {
            return Ok(bad_request(ErrorCode::ValidationFailed, msg));
        }
        update_data.grade_level = Some(grade_level.trim().to_string());
    }
    if let Some(capacity) = update_data.capacity
        && let Err(resp) = check_capacity(capacity)
    {
        return Ok(resp);
    }
    if let Some(year) = update_data.school_year
        && let Err(resp) = check_school_year(year)
    {
        return Ok(resp);
    }
    update_data.room = update_data.room.map(normalize_optional);

    let storage = service.get_storage(request);

    match storage.get_class_by_id(class_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to get class information",
            ));
        }
    }

    if let Some(ref name) = update_data.name
        && let Err(resp) = check_name(&storage, name, Some(class_id)).await
    {
        return Ok(resp);
    }
    if let Some(Some(teacher_id)) = update_data.teacher_id
        && let Err(resp) = check_teacher(&storage, teacher_id).await
    {
        return Ok(resp);
    }

    // 容量不能低于当前在读人数
    if let Some(capacity) = update_data.capacity {
        match storage.count_active_students_in_class(class_id).await {
            Ok(enrolled) if enrolled > capacity as i64 => {
                return Ok(conflict(
                    ErrorCode::ClassCapacityBelowEnrollment,
                    format!("Class has {enrolled} enrolled students, capacity cannot be {capacity}"),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to count class students",
                ));
            }
        }
    }

    match storage.update_class(class_id, update_data).await {
        Ok(Some(class)) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(class, "Class updated successfully")))
        }
        Ok(None) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Class update failed",
        )),
    }
}
