//! 财务服务：流水、收费记录、批量生成学费与汇总

pub mod export;
pub mod generate;
pub mod payments;
pub mod summary;
pub mod transactions;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::ErrorCode;
use crate::models::finance::requests::{
    CreatePaymentRequest, CreateTransactionRequest, GenerateChargesRequest, PayPaymentRequest,
    PaymentListParams, SummaryParams, TransactionFilter, TransactionListParams,
    UpdatePaymentRequest, UpdateTransactionRequest,
};
use crate::services::bad_request;
use crate::storage::Storage;
use crate::utils::dates::{format_date, parse_date, today};
use crate::utils::money::MAX_AMOUNT_CENTS;

pub(super) const CATEGORY_MAX_CHARS: usize = 60;
pub(super) const DESCRIPTION_MAX_CHARS: usize = 200;

pub struct FinanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl FinanceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    // 流水
    pub async fn list_transactions(
        &self,
        query: TransactionListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transactions::list_transactions(self, query, request).await
    }

    pub async fn create_transaction(
        &self,
        data: CreateTransactionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transactions::create_transaction(self, data, request).await
    }

    pub async fn get_transaction(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        transactions::get_transaction(self, id, request).await
    }

    pub async fn update_transaction(
        &self,
        id: i64,
        data: UpdateTransactionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transactions::update_transaction(self, id, data, request).await
    }

    pub async fn delete_transaction(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transactions::delete_transaction(self, id, request).await
    }

    pub async fn export_transactions(
        &self,
        filter: TransactionFilter,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        export::export_transactions(self, filter, request).await
    }

    // 收费记录
    pub async fn list_payments(
        &self,
        query: PaymentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        payments::list_payments(self, query, request).await
    }

    pub async fn create_payment(
        &self,
        data: CreatePaymentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        payments::create_payment(self, data, request).await
    }

    pub async fn get_payment(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        payments::get_payment(self, id, request).await
    }

    pub async fn update_payment(
        &self,
        id: i64,
        data: UpdatePaymentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        payments::update_payment(self, id, data, request).await
    }

    pub async fn pay_payment(
        &self,
        id: i64,
        data: PayPaymentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        payments::pay_payment(self, id, data, request).await
    }

    pub async fn cancel_payment(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        payments::cancel_payment(self, id, request).await
    }

    pub async fn generate_charges(
        &self,
        data: GenerateChargesRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        generate::generate_charges(self, data, request).await
    }

    // 汇总
    pub async fn summary(
        &self,
        params: SummaryParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        summary::finance_summary(self, params, request).await
    }
}

/// 金额必须为正的分值
pub(super) fn check_amount(field: &str, amount_cents: i64) -> Result<(), HttpResponse> {
    if amount_cents <= 0 {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("{field} must be greater than zero"),
        ));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("{field} must not exceed {MAX_AMOUNT_CENTS}"),
        ));
    }
    Ok(())
}

pub(super) fn check_date(value: &str) -> Result<NaiveDate, HttpResponse> {
    parse_date(value).map_err(|e| bad_request(ErrorCode::ValidationFailed, e.message()))
}

/// 规范化后的区间，两端都是 YYYY-MM-DD
pub(super) type DateRange = (Option<String>, Option<String>);

/// 可选的日期区间过滤，起止都给出时要求 from <= to
///
/// 存储层按字符串比较日期，返回值必须替换原始输入再向下传递。
pub(super) fn check_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<DateRange, HttpResponse> {
    let from = from.map(check_date).transpose()?;
    let to = to.map(check_date).transpose()?;
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(bad_request(
            ErrorCode::ValidationFailed,
            "'from' must not be after 'to'",
        ));
    }
    Ok((from.map(format_date), to.map(format_date)))
}

/// 列表和汇总之前把已过期的 pending 记录标为 overdue
///
/// 失败只记日志，不影响读取。
pub(crate) async fn refresh_overdue(storage: &Arc<dyn Storage>) {
    match storage.mark_overdue_payments(&format_date(today())).await {
        Ok(0) => {}
        Ok(count) => debug!("Marked {} payments as overdue", count),
        Err(e) => warn!("Failed to mark overdue payments: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_check_amount() {
        assert!(check_amount("amount_cents", 1).is_ok());
        let resp = check_amount("amount_cents", 0).unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(check_amount("amount_cents", -100).is_err());
        assert!(check_amount("amount_cents", MAX_AMOUNT_CENTS).is_ok());
        let resp = check_amount("amount_cents", MAX_AMOUNT_CENTS + 1).unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(check_amount("amount_cents", i64::MAX).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(None, None).is_ok());
        assert!(check_range(Some("2026-01-01"), None).is_ok());
        assert!(check_range(Some("2026-01-01"), Some("2026-01-01")).is_ok());
        assert!(check_range(Some("2026-02-01"), Some("2026-01-31")).is_err());
        assert!(check_range(Some("01/02/2026"), None).is_err());

        let (from, to) = check_range(Some(" 2026-03-01 "), Some("2026-03-31\t")).unwrap();
        assert_eq!(from.as_deref(), Some("2026-03-01"));
        assert_eq!(to.as_deref(), Some("2026-03-31"));
        assert_eq!(check_range(None, None).unwrap(), (None, None));
    }
}
