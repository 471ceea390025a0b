use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::nullable;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct LoginRequest {
    /// 用户名或邮箱
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// 当前用户修改自己的资料，不能修改角色与状态
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub avatar_url: Option<Option<String>>,
    /// 修改密码时必须提供当前密码
    pub current_password: Option<String>,
    pub password: Option<String>,
}
