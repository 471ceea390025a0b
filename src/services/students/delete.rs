use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::StudentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{conflict, invalidate_dashboard, not_found, storage_error_response};

/// 删除学生；已有收费记录的学生只能改为 inactive / transferred
pub async fn delete_student(
    service: &StudentService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.count_student_payments(student_id).await {
        Ok(0) => {}
        Ok(count) => {
            return Ok(conflict(
                ErrorCode::StudentHasFinancialRecords,
                format!(
                    "Student has {count} payment records, set status to inactive or transferred instead"
                ),
            ));
        }
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to check student payments",
            ));
        }
    }

    match storage.delete_student(student_id).await {
        Ok(true) => {
            info!("Student {} deleted", student_id);
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted successfully")))
        }
        Ok(false) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Student deletion failed",
        )),
    }
}
