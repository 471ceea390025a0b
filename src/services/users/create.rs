use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::{bad_request, conflict, storage_error_response};
use crate::utils::password::hash_password;
use crate::utils::validate::{
    normalize_optional, validate_email, validate_password_simple, validate_username,
};

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    user_data.username = user_data.username.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();

    if let Err(msg) = validate_username(&user_data.username) {
        return Ok(bad_request(ErrorCode::UserNameInvalid, msg));
    }
    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_password_simple(&user_data.password) {
        return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
    }

    let storage = service.get_storage(request);

    // 唯一性预检
    match storage.get_user_by_username(&user_data.username).await {
        Ok(Some(_)) => {
            return Ok(conflict(
                ErrorCode::UserAlreadyExists,
                "Username already exists",
            ));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::UserCreationFailed,
                "User creation failed",
            ));
        }
    }
    match storage.get_user_by_email(&user_data.email).await {
        Ok(Some(_)) => {
            return Ok(conflict(ErrorCode::UserAlreadyExists, "Email already exists"));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::UserCreationFailed,
                "User creation failed",
            ));
        }
    }

    user_data.password = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Password hashing failed: {e}"),
                )),
            );
        }
    };
    user_data.display_name = normalize_optional(user_data.display_name);
    user_data.avatar_url = normalize_optional(user_data.avatar_url);

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("User {} created with role {}", user.username, user.role);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created successfully")))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::UserCreationFailed,
            "User creation failed",
        )),
    }
}
