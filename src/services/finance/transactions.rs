use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CATEGORY_MAX_CHARS, FinanceService, check_amount, check_date, check_range};
use crate::middlewares::RequireJWT;
use crate::models::finance::entities::Transaction;
use crate::models::finance::requests::{
    CreateTransactionRequest, NewTransaction, TransactionListParams, UpdateTransactionRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, conflict, invalidate_dashboard, not_found, storage_error_response,
};
use crate::storage::Storage;
use crate::utils::dates::format_date;
use crate::utils::validate::{normalize_optional, validate_required_text};

fn check_category(category: &str) -> Result<String, HttpResponse> {
    validate_required_text("category", category, CATEGORY_MAX_CHARS)
        .map_err(|msg| bad_request(ErrorCode::ValidationFailed, msg))?;
    Ok(category.trim().to_lowercase())
}

async fn check_student(storage: &Arc<dyn Storage>, student_id: i64) -> Result<(), HttpResponse> {
    match storage.get_student_by_id(student_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request(
            ErrorCode::StudentNotFound,
            format!("Student {student_id} does not exist"),
        )),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to check student",
        )),
    }
}

/// 读取一条可手工修改的流水，由收费生成的流水返回 409
async fn load_editable(
    storage: &Arc<dyn Storage>,
    id: i64,
) -> Result<Transaction, HttpResponse> {
    match storage.get_transaction_by_id(id).await {
        Ok(Some(tx)) if tx.is_locked() => Err(conflict(
            ErrorCode::TransactionLocked,
            "Transaction was generated by a payment and cannot be changed directly",
        )),
        Ok(Some(tx)) => Ok(tx),
        Ok(None) => Err(not_found(
            ErrorCode::TransactionNotFound,
            "Transaction not found",
        )),
        Err(e) => Err(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to get transaction",
        )),
    }
}

pub async fn list_transactions(
    service: &FinanceService,
    mut query: TransactionListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match check_range(query.filter.from.as_deref(), query.filter.to.as_deref()) {
        Ok((from, to)) => (query.filter.from, query.filter.to) = (from, to),
        Err(resp) => return Ok(resp),
    }
    let storage = service.get_storage(request);

    match storage.list_transactions_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Transaction list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to retrieve transaction list",
        )),
    }
}

pub async fn get_transaction(
    service: &FinanceService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_transaction_by_id(id).await {
        Ok(Some(tx)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            tx,
            "Transaction retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(
            ErrorCode::TransactionNotFound,
            "Transaction not found",
        )),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Failed to get transaction",
        )),
    }
}

pub async fn create_transaction(
    service: &FinanceService,
    data: CreateTransactionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let category = match check_category(&data.category) {
        Ok(category) => category,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = check_amount("amount_cents", data.amount_cents) {
        return Ok(resp);
    }
    let occurred_on = match check_date(&data.occurred_on) {
        Ok(date) => format_date(date),
        Err(resp) => return Ok(resp),
    };

    let storage = service.get_storage(request);
    if let Some(student_id) = data.student_id
        && let Err(resp) = check_student(&storage, student_id).await
    {
        return Ok(resp);
    }

    let new_tx = NewTransaction {
        kind: data.kind,
        category,
        description: normalize_optional(data.description),
        amount_cents: data.amount_cents,
        occurred_on,
        student_id: data.student_id,
        payment_id: None,
        created_by: RequireJWT::extract_user_id(request),
    };

    match storage.create_transaction(new_tx).await {
        Ok(tx) => {
            info!("Transaction {} ({} {}) created", tx.id, tx.kind, tx.amount_cents);
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(tx, "Transaction created successfully")))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Transaction creation failed",
        )),
    }
}

pub async fn update_transaction(
    service: &FinanceService,
    id: i64,
    mut data: UpdateTransactionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(ref category) = data.category {
        match check_category(category) {
            Ok(category) => data.category = Some(category),
            Err(resp) => return Ok(resp),
        }
    }
    if let Some(amount) = data.amount_cents
        && let Err(resp) = check_amount("amount_cents", amount)
    {
        return Ok(resp);
    }
    if let Some(ref occurred_on) = data.occurred_on {
        match check_date(occurred_on) {
            Ok(date) => data.occurred_on = Some(format_date(date)),
            Err(resp) => return Ok(resp),
        }
    }
    data.description = data.description.map(normalize_optional);

    let storage = service.get_storage(request);
    if let Err(resp) = load_editable(&storage, id).await {
        return Ok(resp);
    }
    if let Some(Some(student_id)) = data.student_id
        && let Err(resp) = check_student(&storage, student_id).await
    {
        return Ok(resp);
    }

    match storage.update_transaction(id, data).await {
        Ok(Some(tx)) => {
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                tx,
                "Transaction updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(
            ErrorCode::TransactionNotFound,
            "Transaction not found",
        )),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Transaction update failed",
        )),
    }
}

pub async fn delete_transaction(
    service: &FinanceService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    if let Err(resp) = load_editable(&storage, id).await {
        return Ok(resp);
    }

    match storage.delete_transaction(id).await {
        Ok(true) => {
            info!("Transaction {} deleted", id);
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Transaction deleted successfully",
            )))
        }
        Ok(false) => Ok(not_found(
            ErrorCode::TransactionNotFound,
            "Transaction not found",
        )),
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Transaction deletion failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_is_normalized() {
        assert_eq!(check_category("  Material Escolar ").unwrap(), "material escolar");
        assert!(check_category("   ").is_err());
        assert!(check_category(&"x".repeat(CATEGORY_MAX_CHARS + 1)).is_err());
    }
}
