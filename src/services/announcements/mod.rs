pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::middlewares::RequireJWT;
use crate::models::announcements::entities::{Announcement, Audience};
use crate::models::announcements::requests::{
    AnnouncementListParams, CreateAnnouncementRequest, UpdateAnnouncementRequest,
};
use crate::models::users::entities::UserRole;
use crate::storage::Storage;

pub struct AnnouncementService {
    storage: Option<Arc<dyn Storage>>,
}

impl AnnouncementService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_announcements(
        &self,
        query: AnnouncementListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_announcements(self, query, request).await
    }

    pub async fn create_announcement(
        &self,
        data: CreateAnnouncementRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_announcement(self, data, request).await
    }

    pub async fn get_announcement(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_announcement(self, id, request).await
    }

    pub async fn update_announcement(
        &self,
        id: i64,
        data: UpdateAnnouncementRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_announcement(self, id, data, request).await
    }

    pub async fn delete_announcement(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_announcement(self, id, request).await
    }
}

/// 只有教务人员和管理员能看到草稿与所有受众
pub(super) fn sees_everything(role: UserRole) -> bool {
    UserRole::staff_roles().contains(&role)
}

/// 当前用户能否查看该公告
pub(super) fn can_view(announcement: &Announcement, request: &HttpRequest) -> bool {
    match RequireJWT::extract_user_role(request) {
        Some(role) if sees_everything(role) => true,
        Some(role) => {
            announcement.published && Audience::visible_to(role).contains(&announcement.audience)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_see_everything() {
        assert!(sees_everything(UserRole::Admin));
        assert!(sees_everything(UserRole::Staff));
        assert!(!sees_everything(UserRole::Teacher));
    }
}
