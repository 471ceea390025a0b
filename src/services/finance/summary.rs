use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{FinanceService, check_range, refresh_overdue};
use crate::models::finance::requests::SummaryParams;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error_response;
use crate::utils::dates::{current_month_bounds, format_date};

/// 财务汇总，缺省区间为当月
pub async fn finance_summary(
    service: &FinanceService,
    params: SummaryParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (from, to) = match check_range(params.from.as_deref(), params.to.as_deref()) {
        Ok(range) => range,
        Err(resp) => return Ok(resp),
    };
    let (month_start, month_end) = match current_month_bounds() {
        Ok(bounds) => bounds,
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to compute current month",
            ));
        }
    };
    let from = from.unwrap_or_else(|| format_date(month_start));
    let to = to.unwrap_or_else(|| format_date(month_end));
    if let Err(resp) = check_range(Some(&from), Some(&to)) {
        return Ok(resp);
    }

    let storage = service.get_storage(request);
    refresh_overdue(&storage).await;

    match storage.finance_summary(&from, &to).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            summary,
            "Finance summary retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to compute finance summary",
        )),
    }
}
