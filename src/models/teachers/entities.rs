use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::classes::entities::ClassSummary;
use crate::models::common::string_enum;

string_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/teacher.ts")]
    pub enum TeacherStatus ("教师状态") {
        Active => "active",
        Inactive => "inactive",
    }
}

/// 教师档案
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/teacher.ts")]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub hired_on: Option<String>,
    pub status: TeacherStatus,
    /// 关联的登录账号
    pub user_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 教师详情，附带其负责的班级
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/teacher.ts")]
pub struct TeacherDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub teacher: Teacher,
    pub classes: Vec<ClassSummary>,
}
