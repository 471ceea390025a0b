use super::entities::{PaymentMethod, PaymentStatus, TransactionKind};
use crate::models::common::{PaginationQuery, nullable, option_from_str};
use serde::Deserialize;
use ts_rs::TS;

// ==================== 流水 ====================

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "option_from_str")]
    pub student_id: Option<i64>,
    /// 起始日期（含），YYYY-MM-DD
    pub from: Option<String>,
    /// 截止日期（含），YYYY-MM-DD
    pub to: Option<String>,
    /// 匹配分类与描述
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct TransactionListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(flatten)]
    #[ts(flatten)]
    pub filter: TransactionFilter,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub occurred_on: String,
    pub student_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct UpdateTransactionRequest {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    pub amount_cents: Option<i64>,
    pub occurred_on: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub student_id: Option<Option<i64>>,
}

/// 存储层新建流水，`created_by` 与 `payment_id` 由服务层填写
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub occurred_on: String,
    pub student_id: Option<i64>,
    pub payment_id: Option<i64>,
    pub created_by: Option<i64>,
}

// ==================== 收费记录 ====================

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PaymentFilter {
    #[serde(default, deserialize_with = "option_from_str")]
    pub student_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub reference_month: Option<String>,
    /// 到期日起（含）
    pub from: Option<String>,
    /// 到期日止（含）
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PaymentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(flatten)]
    #[ts(flatten)]
    pub filter: PaymentFilter,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct CreatePaymentRequest {
    pub student_id: i64,
    pub description: String,
    pub reference_month: Option<String>,
    pub amount_cents: i64,
    pub due_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct UpdatePaymentRequest {
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub reference_month: Option<Option<String>>,
    pub amount_cents: Option<i64>,
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub notes: Option<Option<String>>,
}

/// 登记收款
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PayPaymentRequest {
    pub payment_method: PaymentMethod,
    /// 实际付款日期，默认今天
    pub paid_on: Option<String>,
    /// 实收金额，默认为本金加罚金和利息
    pub paid_amount_cents: Option<i64>,
    pub notes: Option<String>,
}

/// 按月批量生成学费
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct GenerateChargesRequest {
    /// YYYY-MM
    pub reference_month: String,
    pub amount_cents: i64,
    /// 1..=31，超过当月天数取月末
    pub due_day: u32,
    /// 仅为该班级的学生生成
    pub class_id: Option<i64>,
    pub description: Option<String>,
}

/// 存储层的结算参数
#[derive(Debug, Clone)]
pub struct PaymentSettlement {
    pub payment_method: PaymentMethod,
    pub paid_on: String,
    pub paid_amount_cents: i64,
    pub late_fee_cents: i64,
    pub interest_cents: i64,
    pub notes: Option<String>,
    pub settled_by: Option<i64>,
}

// ==================== 汇总 ====================

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct SummaryParams {
    pub from: Option<String>,
    pub to: Option<String>,
}
