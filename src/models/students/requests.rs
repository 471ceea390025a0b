use super::entities::{StudentSortBy, StudentStatus};
use crate::models::common::{PaginationQuery, SortOrder, nullable, option_from_str};
use serde::Deserialize;
use ts_rs::TS;

/// 学生过滤条件，列表和导出共用
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentFilter {
    #[serde(default, deserialize_with = "option_from_str")]
    pub class_id: Option<i64>,
    pub status: Option<StudentStatus>,
    /// 匹配姓名、学号、监护人姓名
    pub search: Option<String>,
    pub sort_by: Option<StudentSortBy>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(flatten)]
    #[ts(flatten)]
    pub filter: StudentFilter,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct CreateStudentRequest {
    /// 为空时自动生成
    pub enrollment_number: Option<String>,
    pub name: String,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    pub status: Option<StudentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct UpdateStudentRequest {
    pub enrollment_number: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub birth_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub guardian_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub guardian_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub address: Option<Option<String>>,
    /// `null` 表示移出班级
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub class_id: Option<Option<i64>>,
    pub status: Option<StudentStatus>,
}
