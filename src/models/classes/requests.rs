use super::entities::Shift;
use crate::models::common::{PaginationQuery, nullable, option_from_str};
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassFilter {
    #[serde(default, deserialize_with = "option_from_str")]
    pub school_year: Option<i32>,
    pub shift: Option<Shift>,
    #[serde(default, deserialize_with = "option_from_str")]
    pub teacher_id: Option<i64>,
    /// 匹配班级名称、年级、教室
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(flatten)]
    #[ts(flatten)]
    pub filter: ClassFilter,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    pub name: String,
    pub grade_level: String,
    pub shift: Shift,
    pub school_year: i32,
    pub capacity: i32,
    pub teacher_id: Option<i64>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub grade_level: Option<String>,
    pub shift: Option<Shift>,
    pub school_year: Option<i32>,
    pub capacity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub teacher_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub room: Option<Option<String>>,
}
