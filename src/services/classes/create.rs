use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::classes::entities::{MAX_CAPACITY, MIN_CAPACITY};
use crate::models::classes::requests::CreateClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, conflict, invalidate_dashboard, storage_error_response};
use crate::storage::Storage;
use crate::utils::validate::{normalize_optional, validate_required_text};

pub(super) const NAME_MAX_CHARS: usize = 100;
const SCHOOL_YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

pub(super) fn check_capacity(capacity: i32) -> Result<(), HttpResponse> {
    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("Capacity must be between {MIN_CAPACITY} and {MAX_CAPACITY}"),
        ));
    }
    Ok(())
}

pub(super) fn check_school_year(year: i32) -> Result<(), HttpResponse> {
    if !SCHOOL_YEAR_RANGE.contains(&year) {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("School year {year} is out of range"),
        ));
    }
    Ok(())
}

/// 班级名称唯一
pub(super) async fn check_name(
    storage: &Arc<dyn Storage>,
    name: &str,
    current_id: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.get_class_by_name(name).await {
        Ok(Some(existing)) if Some(existing.id) != current_id => Err(conflict(
            ErrorCode::ClassAlreadyExists,
            "Class name already exists",
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to check class name",
        )),
    }
}

/// 负责教师必须存在
pub(super) async fn check_teacher(
    storage: &Arc<dyn Storage>,
    teacher_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_teacher_by_id(teacher_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request(
            ErrorCode::TeacherNotFound,
            format!("Teacher {teacher_id} does not exist"),
        )),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to check teacher",
        )),
    }
}

pub async fn create_class(
    service: &ClassService,
    mut class_data: CreateClassRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_required_text("name", &class_data.name, NAME_MAX_CHARS) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Err(msg) = validate_required_text("grade_level", &class_data.grade_level, NAME_MAX_CHARS)
    {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Err(resp) = check_capacity(class_data.capacity) {
        return Ok(resp);
    }
    if let Err(resp) = check_school_year(class_data.school_year) {
        return Ok(resp);
    }
    class_data.name = class_data.name.trim().to_string();
    class_data.grade_level = class_data.grade_level.trim().to_string();
    class_data.room = normalize_optional(class_data.room);

    let storage = service.get_storage(request);

    if let Err(resp) = check_name(&storage, &class_data.name, None).await {
        return Ok(resp);
    }
    if let Some(teacher_id) = class_data.teacher_id
        && let Err(resp) = check_teacher(&storage, teacher_id).await
    {
        return Ok(resp);
    }

    match storage.create_class(class_data).await {
        Ok(class) => {
            info!("Class {} created", class.name);
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(class, "Class created successfully")))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Class creation failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_capacity_bounds() {
        assert!(check_capacity(1).is_ok());
        assert!(check_capacity(200).is_ok());
        assert_eq!(
            check_capacity(0).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(check_capacity(201).is_err());
    }

    #[test]
    fn test_school_year_bounds() {
        assert!(check_school_year(2026).is_ok());
        assert!(check_school_year(1999).is_err());
    }
}
