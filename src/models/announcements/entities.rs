use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum;
use crate::models::users::entities::UserRole;

string_enum! {
    /// 公告受众
    #[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
    pub enum Audience ("公告受众") {
        All => "all",
        Teachers => "teachers",
        Guardians => "guardians",
        Staff => "staff",
    }
}

impl Audience {
    /// 教师只能看到面向全体或教师的公告
    pub fn visible_to(role: UserRole) -> &'static [Audience] {
        match role {
            UserRole::Teacher => &[Audience::All, Audience::Teachers],
            UserRole::Admin | UserRole::Staff => Audience::ALL,
        }
    }
}

pub const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub published: bool,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
