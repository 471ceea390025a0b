use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use super::create::{check_class_vacancy, check_enrollment_number, check_name, check_optional_fields};
use crate::models::students::entities::StudentStatus;
use crate::models::students::requests::UpdateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{conflict, invalidate_dashboard, not_found, storage_error_response};
use crate::utils::validate::normalize_optional;

pub async fn update_student(
    service: &StudentService,
    student_id: i64,
    mut update_data: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref name) = update_data.name {
        if let Err(e) = check_name(name) {
            return Ok(e.into_response());
        }
        update_data.name = Some(name.trim().to_string());
    }
    if let Some(ref number) = update_data.enrollment_number {
        let number = number.trim().to_string();
        if let Err(e) = check_enrollment_number(&number) {
            return Ok(e.into_response());
        }
        update_data.enrollment_number = Some(number);
    }
    update_data.birth_date = update_data.birth_date.map(normalize_optional);
    update_data.email = update_data
        .email
        .map(|e| normalize_optional(e).map(|e| e.to_lowercase()));
    update_data.phone = update_data.phone.map(normalize_optional);
    update_data.guardian_name = update_data.guardian_name.map(normalize_optional);
    update_data.guardian_phone = update_data.guardian_phone.map(normalize_optional);
    update_data.address = update_data.address.map(normalize_optional);

    if let Err(e) = check_optional_fields(
        update_data.birth_date.as_ref().and_then(|v| v.as_deref()),
        update_data.email.as_ref().and_then(|v| v.as_deref()),
        update_data.phone.as_ref().and_then(|v| v.as_deref()),
        update_data.guardian_phone.as_ref().and_then(|v| v.as_deref()),
        update_data.address.as_ref().and_then(|v| v.as_deref()),
    ) {
        return Ok(e.into_response());
    }

    let storage = service.get_storage(request);

    let current = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to get student",
            ));
        }
    };

    if let Some(ref number) = update_data.enrollment_number
        && *number != current.enrollment_number
    {
        match storage.get_student_by_enrollment_number(number).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                return Ok(conflict(
                    ErrorCode::StudentAlreadyExists,
                    format!("Enrollment number {number} already exists"),
                ));
            }
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to check enrollment number",
                ));
            }
        }
    }

    // 以更新后的班级和状态判断是否占用新名额
    let target_class = match update_data.class_id {
        Some(class_id) => class_id,
        None => current.class_id,
    };
    let target_status = update_data.status.unwrap_or(current.status);
    if let Some(class_id) = target_class
        && target_status == StudentStatus::Active
    {
        let already_enrolled =
            current.class_id == Some(class_id) && current.status == StudentStatus::Active;
        if let Err(e) = check_class_vacancy(&storage, class_id, already_enrolled).await {
            return Ok(e.into_response());
        }
    }

    match storage.update_student(student_id, update_data).await {
        Ok(Some(student)) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                student,
                "Student updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Student update failed",
        )),
    }
}
