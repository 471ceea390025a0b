use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::payments::check_month;
use super::{DESCRIPTION_MAX_CHARS, FinanceService, check_amount};
use crate::models::finance::requests::GenerateChargesRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, invalidate_dashboard, storage_error_response};
use crate::storage::MonthlyChargePlan;
use crate::utils::dates::{due_date_in_month, format_date, parse_month};
use crate::utils::validate::{normalize_optional, validate_required_text};

const MAX_DUE_DAY: u32 = 31;

pub(super) fn default_description(reference_month: &str) -> String {
    format!("Mensalidade {reference_month}")
}

/// 根据请求生成批量计划，到期日超出当月天数时取月末
pub(super) fn build_plan(data: GenerateChargesRequest) -> Result<MonthlyChargePlan, HttpResponse> {
    let reference_month = check_month(&data.reference_month)?;
    check_amount("amount_cents", data.amount_cents)?;
    if !(1..=MAX_DUE_DAY).contains(&data.due_day) {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("due_day must be between 1 and {MAX_DUE_DAY}"),
        ));
    }

    let (year, month) = parse_month(&reference_month)
        .map_err(|e| bad_request(ErrorCode::ValidationFailed, e.message()))?;
    let due_date = due_date_in_month(year, month, data.due_day)
        .map_err(|e| bad_request(ErrorCode::ValidationFailed, e.message()))?;

    let description = match normalize_optional(data.description) {
        Some(description) => {
            validate_required_text("description", &description, DESCRIPTION_MAX_CHARS)
                .map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
            description
        }
        None => default_description(&reference_month),
    };

    Ok(MonthlyChargePlan {
        reference_month,
        due_date: format_date(due_date),
        amount_cents: data.amount_cents,
        description,
        class_id: data.class_id,
    })
}

/// 为在读学生批量生成当月学费
pub async fn generate_charges(
    service: &FinanceService,
    data: GenerateChargesRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let plan = match build_plan(data) {
        Ok(plan) => plan,
        Err(resp) => return Ok(resp),
    };

    let storage = service.get_storage(request);

    if let Some(class_id) = plan.class_id {
        match storage.get_class_by_id(class_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(bad_request(
                    ErrorCode::ClassNotFound,
                    format!("Class {class_id} does not exist"),
                ));
            }
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to check class",
                ));
            }
        }
    }

    match storage.generate_monthly_charges(plan).await {
        Ok(result) => {
            info!(
                "Monthly charges for {}: {} created, {} skipped",
                result.reference_month, result.created, result.skipped
            );
            if result.created > 0 {
                invalidate_dashboard(request).await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                result,
                "Monthly charges generated",
            )))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Monthly charge generation failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(month: &str, due_day: u32) -> GenerateChargesRequest {
        GenerateChargesRequest {
            reference_month: month.to_string(),
            amount_cents: 45_000,
            due_day,
            class_id: None,
            description: None,
        }
    }

    #[test]
    fn test_due_day_clamped_to_month_end() {
        let plan = build_plan(request("2026-02", 31)).unwrap();
        assert_eq!(plan.due_date, "2026-02-28");
        let plan = build_plan(request("2028-02", 30)).unwrap();
        assert_eq!(plan.due_date, "2028-02-29");
        let plan = build_plan(request("2026-04", 10)).unwrap();
        assert_eq!(plan.due_date, "2026-04-10");
    }

    #[test]
    fn test_default_description() {
        let plan = build_plan(request("2026-05", 5)).unwrap();
        assert_eq!(plan.description, "Mensalidade 2026-05");

        let mut req = request("2026-05", 5);
        req.description = Some("  Material didático ".to_string());
        assert_eq!(build_plan(req).unwrap().description, "Material didático");
    }

    #[test]
    fn test_invalid_plans_rejected() {
        assert!(build_plan(request("2026-05", 0)).is_err());
        assert!(build_plan(request("2026-05", 32)).is_err());
        assert!(build_plan(request("2026-5", 10)).is_err());

        let mut req = request("2026-05", 10);
        req.amount_cents = 0;
        assert!(build_plan(req).is_err());
    }
}
