use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, cache_from_request, not_found, storage_error_response};

/// 初始管理员账号
const ROOT_USER_ID: i64 = 1;

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current_user_id = RequireJWT::extract_user_id(request);
    if user_id == ROOT_USER_ID || current_user_id == Some(user_id) {
        return Ok(bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete the current user or the initial administrator",
        ));
    }

    let storage = service.get_storage(request);

    match storage.delete_user(user_id).await {
        Ok(true) => {
            info!("User {} deleted by {:?}", user_id, current_user_id);
            if let Some(cache) = cache_from_request(request) {
                cache.invalidate_all().await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::UserDeleteFailed,
            "User deletion failed",
        )),
    }
}
