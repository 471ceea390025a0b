use super::entities::{PaymentRecord, Transaction, TransactionKind};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct TransactionListResponse {
    pub items: Vec<Transaction>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PaymentListResponse {
    pub items: Vec<PaymentRecord>,
    pub pagination: PaginationInfo,
}

/// 收款结果：更新后的收费记录与对应的收入流水
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PaymentSettledResponse {
    pub payment: PaymentRecord,
    pub transaction: Transaction,
}

#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct GenerateChargesResponse {
    pub reference_month: String,
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct CategoryTotal {
    pub kind: TransactionKind,
    pub category: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct MonthlyTotal {
    /// YYYY-MM
    pub month: String,
    pub income_cents: i64,
    pub expense_cents: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct FinanceSummary {
    pub from: String,
    pub to: String,
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    pub balance_cents: i64,
    pub by_category: Vec<CategoryTotal>,
    pub monthly: Vec<MonthlyTotal>,
    /// 未到期的应收款
    pub pending_receivables_cents: i64,
    pub overdue_receivables_cents: i64,
    pub overdue_count: i64,
}
