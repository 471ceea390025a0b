use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::TeacherService;
use crate::models::{ApiResponse, ErrorCode, teachers::requests::CreateTeacherRequest};
use crate::services::{bad_request, conflict, invalidate_dashboard, storage_error_response};
use crate::storage::Storage;
use crate::utils::dates::parse_date;
use crate::utils::validate::{
    normalize_optional, validate_email, validate_phone, validate_required_text,
};

pub(super) const NAME_MAX_CHARS: usize = 120;

/// 校验邮箱格式并检查是否被其他教师占用
pub(super) async fn check_email(
    storage: &Arc<dyn Storage>,
    email: &str,
    current_id: Option<i64>,
) -> Result<(), HttpResponse> {
    validate_email(email).map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    match storage.get_teacher_by_email(email).await {
        Ok(Some(existing)) if Some(existing.id) != current_id => Err(conflict(
            ErrorCode::TeacherAlreadyExists,
            "A teacher with this email already exists",
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to check teacher email",
        )),
    }
}

pub(super) fn check_optional_fields(
    phone: Option<&str>,
    hired_on: Option<&str>,
) -> Result<(), HttpResponse> {
    if let Some(phone) = phone {
        validate_phone(phone).map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    }
    if let Some(hired_on) = hired_on {
        parse_date(hired_on)
            .map_err(|e| bad_request(ErrorCode::ValidationFailed, e.message()))?;
    }
    Ok(())
}

/// 关联的登录账号必须存在
pub(super) async fn check_user_link(
    storage: &Arc<dyn Storage>,
    user_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_id(user_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("User {user_id} does not exist"),
        )),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to check linked user",
        )),
    }
}

pub async fn create_teacher(
    service: &TeacherService,
    mut teacher_data: CreateTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_required_text("name", &teacher_data.name, NAME_MAX_CHARS) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    teacher_data.name = teacher_data.name.trim().to_string();
    teacher_data.email = teacher_data.email.trim().to_lowercase();
    teacher_data.phone = normalize_optional(teacher_data.phone);
    teacher_data.subject = normalize_optional(teacher_data.subject);
    teacher_data.hired_on = normalize_optional(teacher_data.hired_on);

    if let Err(resp) =
        check_optional_fields(teacher_data.phone.as_deref(), teacher_data.hired_on.as_deref())
    {
        return Ok(resp);
    }

    let storage = service.get_storage(request);

    if let Err(resp) = check_email(&storage, &teacher_data.email, None).await {
        return Ok(resp);
    }
    if let Some(user_id) = teacher_data.user_id
        && let Err(resp) = check_user_link(&storage, user_id).await
    {
        return Ok(resp);
    }

    match storage.create_teacher(teacher_data).await {
        Ok(teacher) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(teacher, "Teacher created successfully")))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Teacher creation failed",
        )),
    }
}
