use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode, PaginationQuery};
use crate::services::{not_found, storage_error_response};

pub async fn list_class_students(
    service: &ClassService,
    class_id: i64,
    query: PaginationQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
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

    match storage.list_class_students(class_id, query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Class students retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to retrieve class students",
        )),
    }
}
