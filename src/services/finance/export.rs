//! 流水导出

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{FinanceService, check_range};
use crate::models::ErrorCode;
use crate::models::finance::entities::Transaction;
use crate::models::finance::requests::TransactionFilter;
use crate::services::storage_error_response;
use crate::utils::money::format_cents;

const EXPORT_HEADERS: [&str; 10] = [
    "id",
    "occurred_on",
    "kind",
    "category",
    "description",
    "amount",
    "student_id",
    "student_name",
    "payment_id",
    "created_at",
];

pub async fn export_transactions(
    service: &FinanceService,
    mut filter: TransactionFilter,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match check_range(filter.from.as_deref(), filter.to.as_deref()) {
        Ok((from, to)) => (filter.from, filter.to) = (from, to),
        Err(resp) => return Ok(resp),
    }
    let storage = service.get_storage(request);

    let transactions = match storage.list_transactions(filter).await {
        Ok(list) => list,
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::ExportFailed,
                "Failed to export transactions",
            ));
        }
    };

    let data = write_csv(&transactions).map_err(|e| {
        error!("Transaction CSV generation failed: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV generation failed: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"transacoes.csv\"",
        ))
        .body(data))
}

fn write_csv(transactions: &[Transaction]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(EXPORT_HEADERS)?;

    for tx in transactions {
        wtr.write_record([
            tx.id.to_string(),
            tx.occurred_on.clone(),
            tx.kind.to_string(),
            tx.category.clone(),
            tx.description.clone().unwrap_or_default(),
            format_cents(tx.amount_cents),
            tx.student_id.map(|id| id.to_string()).unwrap_or_default(),
            tx.student_name.clone().unwrap_or_default(),
            tx.payment_id.map(|id| id.to_string()).unwrap_or_default(),
            tx.created_at.to_rfc3339(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finance::entities::TransactionKind;

    #[test]
    fn test_amount_written_as_decimal() {
        let tx = Transaction {
            id: 4,
            kind: TransactionKind::Expense,
            category: "utilities".to_string(),
            description: Some("Conta de luz".to_string()),
            amount_cents: 18_990,
            occurred_on: "2026-03-05".to_string(),
            student_id: None,
            student_name: None,
            payment_id: None,
            created_by: Some(1),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let text = String::from_utf8(write_csv(&[tx]).unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(EXPORT_HEADERS.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("4,2026-03-05,expense,utilities,Conta de luz,189.90,,,,"));
    }
}
