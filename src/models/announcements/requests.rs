use super::entities::Audience;
use crate::models::common::{PaginationQuery, option_from_str};
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct AnnouncementFilter {
    pub audience: Option<Audience>,
    #[serde(default, deserialize_with = "option_from_str")]
    pub published: Option<bool>,
    /// 匹配标题与正文
    pub search: Option<String>,
    /// 按角色限制可见受众，由服务层填写
    #[serde(skip)]
    #[ts(skip)]
    pub visible_audiences: Option<Vec<Audience>>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct AnnouncementListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(flatten)]
    #[ts(flatten)]
    pub filter: AnnouncementFilter,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
    #[serde(default = "default_audience")]
    pub audience: Audience,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub audience: Option<Audience>,
    pub published: Option<bool>,
}

fn default_audience() -> Audience {
    Audience::All
}
