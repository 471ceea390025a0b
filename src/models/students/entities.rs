use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum;

string_enum! {
    /// 学籍状态
    #[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
    pub enum StudentStatus ("学籍状态") {
        Active => "active",
        Inactive => "inactive",
        Transferred => "transferred",
        Graduated => "graduated",
    }
}

string_enum! {
    /// 学生列表排序字段
    #[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
    pub enum StudentSortBy ("排序字段") {
        Name => "name",
        EnrollmentNumber => "enrollment_number",
        CreatedAt => "created_at",
    }
}

/// 学生实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub enrollment_number: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    /// 列表与详情中附带的班级名称
    pub class_name: Option<String>,
    pub status: StudentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
