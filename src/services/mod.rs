pub mod announcements;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod finance;
pub mod students;
pub mod teachers;
pub mod users;

pub use announcements::AnnouncementService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use finance::FinanceService;
pub use students::StudentService;
pub use teachers::TeacherService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, http::StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::cache::{DASHBOARD_CACHE_KEY, ObjectCache};
use crate::errors::SchoolError;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub(crate) fn storage_from_request(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

pub(crate) fn cache_from_request(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|cache| cache.get_ref().clone())
}

/// 业务数据变更后丢弃首页概览缓存
pub(crate) async fn invalidate_dashboard(request: &HttpRequest) {
    if let Some(cache) = cache_from_request(request) {
        cache.remove(DASHBOARD_CACHE_KEY).await;
    }
}

/// 存储层错误转为 HTTP 响应
///
/// `fallback` 用于数据库等内部错误，日志中带上 `context`。
pub(crate) fn storage_error_response(
    err: &SchoolError,
    fallback: ErrorCode,
    context: &str,
) -> HttpResponse {
    let (status, code) = match err {
        SchoolError::Validation(_) | SchoolError::DateParse(_) => {
            (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed)
        }
        SchoolError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        SchoolError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        SchoolError::InvalidState(_) => (StatusCode::CONFLICT, ErrorCode::PaymentInvalidState),
        SchoolError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::AuthFailed),
        SchoolError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        // 并发请求越过了服务层的唯一性预检
        SchoolError::DatabaseOperation(msg) if is_unique_violation(msg) => {
            return HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::Conflict,
                "Record already exists",
            ));
        }
        _ => {
            error!("{}: {}", context, err);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(fallback, format!("{context}: {err}")));
        }
    };

    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}

/// SQLite / PostgreSQL / MySQL 的唯一约束错误文本
fn is_unique_violation(message: &str) -> bool {
    message.contains("UNIQUE constraint failed")
        || message.contains("duplicate key value")
        || message.contains("Duplicate entry")
}

/// 400 校验失败
pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn conflict(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Unauthorized access, please login",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_storage_error_status_mapping() {
        let cases = [
            (SchoolError::validation("x"), StatusCode::BAD_REQUEST),
            (SchoolError::date_parse("x"), StatusCode::BAD_REQUEST),
            (SchoolError::not_found("x"), StatusCode::NOT_FOUND),
            (SchoolError::conflict("x"), StatusCode::CONFLICT),
            (SchoolError::invalid_state("x"), StatusCode::CONFLICT),
            (
                SchoolError::database_operation("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SchoolError::database_operation("UNIQUE constraint failed: students.email"),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            let resp = storage_error_response(&err, ErrorCode::InternalServerError, "test");
            assert_eq!(resp.status(), status, "{err}");
        }
    }

    #[actix_rt::test]
    async fn test_invalid_state_body() {
        let resp = storage_error_response(
            &SchoolError::invalid_state("paid -> cancelled"),
            ErrorCode::InternalServerError,
            "cancel",
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], ErrorCode::PaymentInvalidState as i32);
        assert_eq!(json["message"], "paid -> cancelled");
    }
}
