use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum;

string_enum! {
    /// 用户角色
    #[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
    pub enum UserRole ("用户角色") {
        Admin => "admin",     // 管理员
        Staff => "staff",     // 教务/财务职员
        Teacher => "teacher", // 教师
    }
}

impl UserRole {
    pub fn admin_roles() -> &'static [UserRole] {
        &[UserRole::Admin]
    }

    /// 教务与财务写权限
    pub fn staff_roles() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Staff]
    }

    pub fn all_roles() -> &'static [UserRole] {
        UserRole::ALL
    }
}

string_enum! {
    /// 用户状态
    #[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
    pub enum UserStatus ("用户状态") {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

/// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_groups() {
        assert!(UserRole::staff_roles().contains(&UserRole::Staff));
        assert!(!UserRole::staff_roles().contains(&UserRole::Teacher));
        assert_eq!(UserRole::all_roles().len(), 3);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "admin".into(),
            email: "admin@escola.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            display_name: None,
            avatar_url: None,
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
