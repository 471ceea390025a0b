use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct ClassOccupancy {
    pub class_id: i64,
    pub name: String,
    pub enrolled: i64,
    pub capacity: i32,
}

/// 首页概览，序列化后写入缓存
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardOverview {
    pub total_students: i64,
    pub active_students: i64,
    pub total_classes: i64,
    pub total_teachers: i64,
    pub active_teachers: i64,
    /// YYYY-MM
    pub month: String,
    pub month_income_cents: i64,
    pub month_expense_cents: i64,
    pub month_balance_cents: i64,
    pub overdue_payments: i64,
    pub overdue_amount_cents: i64,
    pub class_occupancy: Vec<ClassOccupancy>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
