use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{
    DESCRIPTION_MAX_CHARS, FinanceService, check_amount, check_date, check_range, refresh_overdue,
};
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::finance::entities::{PaymentRecord, PaymentStatus};
use crate::models::finance::requests::{
    CreatePaymentRequest, PayPaymentRequest, PaymentListParams, PaymentSettlement,
    UpdatePaymentRequest,
};
use crate::models::finance::responses::PaymentSettledResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, conflict, invalidate_dashboard, not_found, storage_error_response,
};
use crate::utils::dates::{format_date, parse_month, today};
use crate::utils::money::{LateCharges, add_cents, compute_late_charges};
use crate::utils::validate::{normalize_optional, validate_required_text};

fn payment_not_found() -> HttpResponse {
    not_found(ErrorCode::PaymentNotFound, "Payment record not found")
}

fn check_description(description: &str) -> Result<String, HttpResponse> {
    validate_required_text("description", description, DESCRIPTION_MAX_CHARS)
        .map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    Ok(description.trim().to_string())
}

/// 规范化为 YYYY-MM
pub(super) fn check_month(value: &str) -> Result<String, HttpResponse> {
    let (year, month) =
        parse_month(value).map_err(|e| bad_request(ErrorCode::ValidationFailed, e.message()))?;
    Ok(format!("{year:04}-{month:02}"))
}

/// 按付款日计算逾期费用
fn late_charges_for(payment: &PaymentRecord, paid_on: chrono::NaiveDate) -> LateCharges {
    let days_after_due = match check_date(&payment.due_date) {
        Ok(due) => (paid_on - due).num_days(),
        Err(_) => 0,
    };
    compute_late_charges(
        payment.amount_cents,
        days_after_due,
        &AppConfig::get().finance,
    )
}

pub async fn list_payments(
    service: &FinanceService,
    mut query: PaymentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match check_range(query.filter.from.as_deref(), query.filter.to.as_deref()) {
        Ok((from, to)) => (query.filter.from, query.filter.to) = (from, to),
        Err(resp) => return Ok(resp),
    }
    if let Some(month) = normalize_optional(query.filter.reference_month.take()) {
        match check_month(&month) {
            Ok(month) => query.filter.reference_month = Some(month),
            Err(resp) => return Ok(resp),
        }
    }

    let storage = service.get_storage(request);
    refresh_overdue(&storage).await;

    match storage.list_payments_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Payment list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to retrieve payment list",
        )),
    }
}

pub async fn get_payment(
    service: &FinanceService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    refresh_overdue(&storage).await;

    match storage.get_payment_by_id(id).await {
        Ok(Some(payment)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            payment,
            "Payment record retrieved successfully",
        ))),
        Ok(None) => Ok(payment_not_found()),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to get payment record",
        )),
    }
}

pub async fn create_payment(
    service: &FinanceService,
    mut data: CreatePaymentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match check_description(&data.description) {
        Ok(description) => data.description = description,
        Err(resp) => return Ok(resp),
    }
    if let Err(resp) = check_amount("amount_cents", data.amount_cents) {
        return Ok(resp);
    }
    match check_date(&data.due_date) {
        Ok(date) => data.due_date = format_date(date),
        Err(resp) => return Ok(resp),
    }
    data.reference_month = normalize_optional(data.reference_month);
    if let Some(ref month) = data.reference_month {
        match check_month(month) {
            Ok(month) => data.reference_month = Some(month),
            Err(resp) => return Ok(resp),
        }
    }
    data.notes = normalize_optional(data.notes);

    let storage = service.get_storage(request);

    match storage.get_student_by_id(data.student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(bad_request(
                ErrorCode::StudentNotFound,
                format!("Student {} does not exist", data.student_id),
            ));
        }
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to check student",
            ));
        }
    }

    match storage.create_payment(data).await {
        Ok(payment) => {
            info!(
                "Payment record {} created for student {}",
                payment.id, payment.student_id
            );
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                payment,
                "Payment record created successfully",
            )))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Payment record creation failed",
        )),
    }
}

/// 仅 pending / overdue 的记录可修改
pub async fn update_payment(
    service: &FinanceService,
    id: i64,
    mut data: UpdatePaymentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref description) = data.description {
        match check_description(description) {
            Ok(description) => data.description = Some(description),
            Err(resp) => return Ok(resp),
        }
    }
    if let Some(amount) = data.amount_cents
        && let Err(resp) = check_amount("amount_cents", amount)
    {
        return Ok(resp);
    }
    if let Some(ref due_date) = data.due_date {
        match check_date(due_date) {
            Ok(date) => data.due_date = Some(format_date(date)),
            Err(resp) => return Ok(resp),
        }
    }
    if let Some(month) = data.reference_month.take() {
        data.reference_month = match normalize_optional(month) {
            Some(month) => match check_month(&month) {
                Ok(month) => Some(Some(month)),
                Err(resp) => return Ok(resp),
            },
            None => Some(None),
        };
    }
    data.notes = data.notes.map(normalize_optional);

    let storage = service.get_storage(request);

    match storage.get_payment_by_id(id).await {
        Ok(Some(payment)) if !payment.status.is_open() => {
            return Ok(conflict(
                ErrorCode::PaymentInvalidState,
                format!("Payment record is {} and cannot be changed", payment.status),
            ));
        }
        Ok(Some(_)) => {}
        Ok(None) => return Ok(payment_not_found()),
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to get payment record",
            ));
        }
    }

    match storage.update_payment(id, data).await {
        Ok(Some(payment)) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                payment,
                "Payment record updated successfully",
            )))
        }
        Ok(None) => Ok(payment_not_found()),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Payment record update failed",
        )),
    }
}

/// 登记收款
///
/// 付款日超过到期日加宽限期时计算罚金与利息，
/// 收费记录变为 paid 并在同一事务内生成学费收入流水。
pub async fn pay_payment(
    service: &FinanceService,
    id: i64,
    data: PayPaymentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let paid_on = match data.paid_on.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => match check_date(value) {
            Ok(date) => date,
            Err(resp) => return Ok(resp),
        },
        _ => today(),
    };
    if paid_on > today() {
        return Ok(bad_request(
            ErrorCode::ValidationFailed,
            "paid_on cannot be in the future",
        ));
    }
    if let Some(amount) = data.paid_amount_cents
        && let Err(resp) = check_amount("paid_amount_cents", amount)
    {
        return Ok(resp);
    }

    let storage = service.get_storage(request);

    let payment = match storage.get_payment_by_id(id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => return Ok(payment_not_found()),
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to get payment record",
            ));
        }
    };
    if !payment.status.can_transition_to(PaymentStatus::Paid) {
        return Ok(conflict(
            ErrorCode::PaymentInvalidState,
            format!("Payment record is {} and cannot be paid", payment.status),
        ));
    }

    let charges = late_charges_for(&payment, paid_on);
    let paid_amount_cents = match data.paid_amount_cents {
        Some(amount) => amount,
        None => match add_cents(payment.amount_cents, charges.total()) {
            Ok(amount) => amount,
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Payment registration failed",
                ));
            }
        },
    };
    let settlement = PaymentSettlement {
        payment_method: data.payment_method,
        paid_on: format_date(paid_on),
        paid_amount_cents,
        late_fee_cents: charges.late_fee_cents,
        interest_cents: charges.interest_cents,
        notes: normalize_optional(data.notes),
        settled_by: RequireJWT::extract_user_id(request),
    };

    match storage.settle_payment(id, settlement).await {
        Ok(Some((payment, transaction))) => {
            info!(
                "Payment {} settled with {} cents ({} days late)",
                payment.id, transaction.amount_cents, charges.days_late
            );
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                PaymentSettledResponse {
                    payment,
                    transaction,
                },
                "Payment registered successfully",
            )))
        }
        Ok(None) => Ok(payment_not_found()),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Payment registration failed",
        )),
    }
}

pub async fn cancel_payment(
    service: &FinanceService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.transition_payment(id, PaymentStatus::Cancelled).await {
        Ok(Some(payment)) => {
            info!("Payment {} cancelled", payment.id);
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                payment,
                "Payment record cancelled",
            )))
        }
        Ok(None) => Ok(payment_not_found()),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Payment cancellation failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dates::format_month;

    #[test]
    fn test_check_month_normalizes() {
        assert_eq!(check_month(" 2026-03 ").unwrap(), "2026-03");
        assert!(check_month("2026-13").is_err());
        assert!(check_month("03/2026").is_err());
    }

    #[test]
    fn test_format_month_matches_check_month() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert_eq!(check_month(&format_month(date)).unwrap(), "2026-07");
    }
}
