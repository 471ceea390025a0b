use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum;

string_enum! {
    /// 上课时段
    #[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
    pub enum Shift ("上课时段") {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        FullTime => "full_time",
    }
}

pub const MIN_CAPACITY: i32 = 1;
pub const MAX_CAPACITY: i32 = 200;

/// 班级实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub grade_level: String,
    pub shift: Shift,
    pub school_year: i32,
    pub capacity: i32,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub room: Option<String>,
    /// 当前在班学生数
    pub enrolled_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Class {
    pub fn has_vacancy(&self) -> bool {
        self.enrolled_count < self.capacity as i64
    }
}

/// 班级简要信息，用于教师详情
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub shift: Shift,
    pub school_year: i32,
}
