use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::user_cache_key;
use crate::middlewares::RequireJWT;
use crate::models::auth::requests::UpdateProfileRequest;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, cache_from_request, storage_error_response, unauthorized};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{normalize_optional, validate_email, validate_password_simple};

use super::AuthService;

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(current_user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request);

    // 缓存中的用户不含密码哈希，这里从存储重新读取
    let current_user = match storage.get_user_by_id(current_user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::UserUpdateFailed,
                "Failed to load current user",
            ));
        }
    };

    let email = match update_data.email.map(|e| e.trim().to_lowercase()) {
        Some(email) => {
            if let Err(msg) = validate_email(&email) {
                return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
            }
            if let Ok(Some(existing)) = storage.get_user_by_email(&email).await
                && existing.id != current_user.id
            {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Email is already in use",
                )));
            }
            Some(email)
        }
        None => None,
    };

    let password = match update_data.password {
        Some(password) => {
            let current_ok = update_data
                .current_password
                .as_deref()
                .is_some_and(|current| verify_password(current, &current_user.password_hash));
            if !current_ok {
                return Ok(bad_request(
                    ErrorCode::UserPasswordInvalid,
                    "Current password is incorrect",
                ));
            }
            if let Err(msg) = validate_password_simple(&password) {
                return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
            }
            match hash_password(&password) {
                Ok(hash) => Some(hash),
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
        None => None,
    };

    // 角色与状态不能通过个人资料修改
    let storage_update = UpdateUserRequest {
        email,
        password,
        role: None,
        status: None,
        display_name: update_data.display_name.map(normalize_optional),
        avatar_url: update_data.avatar_url.map(normalize_optional),
    };

    match storage.update_user(current_user.id, storage_update).await {
        Ok(Some(user)) => {
            if let Some(cache) = cache_from_request(request)
                && let Some(token) = request
                    .headers()
                    .get("Authorization")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "))
            {
                cache.remove(&user_cache_key(token.trim())).await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "Profile updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::UserUpdateFailed,
            "Failed to update profile",
        )),
    }
}
