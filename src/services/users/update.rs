use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::{bad_request, cache_from_request, conflict, not_found, storage_error_response};
use crate::utils::password::hash_password;
use crate::utils::validate::{normalize_optional, validate_email, validate_password_simple};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    if let Some(email) = update_data.email.take() {
        let email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(&email) {
            return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
        }
        match storage.get_user_by_email(&email).await {
            Ok(Some(existing)) if existing.id != user_id => {
                return Ok(conflict(ErrorCode::UserAlreadyExists, "Email already exists"));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::UserUpdateFailed,
                    "Failed to update user information",
                ));
            }
        }
        update_data.email = Some(email);
    }

    if let Some(password) = update_data.password.take() {
        if let Err(msg) = validate_password_simple(&password) {
            return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
        }
        match hash_password(&password) {
            Ok(hash) => update_data.password = Some(hash),
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Password hashing failed: {e}"),
                    )),
                );
            }
        }
    }

    update_data.display_name = update_data.display_name.map(normalize_optional);
    update_data.avatar_url = update_data.avatar_url.map(normalize_optional);

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            // 缓存以令牌为键，无法只清除该用户，角色或状态变更需立即生效
            if let Some(cache) = cache_from_request(request) {
                cache.invalidate_all().await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "User information updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::UserUpdateFailed,
            "Failed to update user information",
        )),
    }
}
