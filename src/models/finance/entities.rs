use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum;

/// 收费记录自动入账时使用的分类
pub const TUITION_CATEGORY: &str = "tuition";

string_enum! {
    /// 收支类型
    #[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
    pub enum TransactionKind ("收支类型") {
        Income => "income",
        Expense => "expense",
    }
}

string_enum! {
    /// 收费状态
    #[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
    pub enum PaymentStatus ("收费状态") {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl PaymentStatus {
    /// 状态迁移规则：
    /// pending -> paid | cancelled | overdue，overdue -> paid | cancelled，
    /// paid 与 cancelled 为终态
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Pending, Overdue)
                | (Overdue, Paid)
                | (Overdue, Cancelled)
        )
    }

    /// 是否仍可修改、收款或取消
    pub fn is_open(self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Overdue)
    }
}

string_enum! {
    /// 付款方式
    #[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
    pub enum PaymentMethod ("付款方式") {
        Cash => "cash",
        Pix => "pix",
        Card => "card",
        Boleto => "boleto",
        Transfer => "transfer",
    }
}

/// 财务流水
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub occurred_on: String,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    /// 由收费记录生成的流水不可直接修改
    pub payment_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Transaction {
    pub fn is_locked(&self) -> bool {
        self.payment_id.is_some()
    }
}

/// 学生收费记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/finance.ts")]
pub struct PaymentRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: Option<String>,
    pub description: String,
    pub reference_month: Option<String>,
    pub amount_cents: i64,
    pub due_date: String,
    pub status: PaymentStatus,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub paid_amount_cents: Option<i64>,
    pub late_fee_cents: i64,
    pub interest_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Overdue));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Overdue.can_transition_to(Paid));
        assert!(Overdue.can_transition_to(Cancelled));
        assert!(!Overdue.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
        for status in PaymentStatus::ALL {
            assert!(!status.can_transition_to(*status));
        }
    }

    #[test]
    fn test_open_states() {
        assert!(PaymentStatus::Pending.is_open());
        assert!(PaymentStatus::Overdue.is_open());
        assert!(!PaymentStatus::Paid.is_open());
        assert!(!PaymentStatus::Cancelled.is_open());
    }
}
