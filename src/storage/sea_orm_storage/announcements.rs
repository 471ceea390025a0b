use super::{SeaOrmStorage, collect_ids, fetch_page, now_ts};
use crate::entity::announcements::{ActiveModel, Column, Entity as Announcements, Model};
use crate::errors::{Result, SchoolError};
use crate::models::announcements::{
    entities::Announcement,
    requests::{AnnouncementListParams, CreateAnnouncementRequest, UpdateAnnouncementRequest},
    responses::AnnouncementListResponse,
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    async fn hydrate_announcements(&self, models: Vec<Model>) -> Result<Vec<Announcement>> {
        let author_names = self
            .load_user_names(collect_ids(&models, |m| m.author_id))
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let author_name = m.author_id.and_then(|id| author_names.get(&id).cloned());
                m.into_announcement(author_name)
            })
            .collect())
    }

    async fn hydrate_announcement(&self, model: Model) -> Result<Announcement> {
        self.hydrate_announcements(vec![model])
            .await?
            .pop()
            .ok_or_else(|| SchoolError::database_operation("读取公告失败"))
    }

    pub async fn create_announcement_impl(
        &self,
        req: CreateAnnouncementRequest,
        author_id: Option<i64>,
    ) -> Result<Announcement> {
        let now = now_ts();

        let model = ActiveModel {
            title: Set(req.title),
            body: Set(req.body),
            audience: Set(req.audience.to_string()),
            published: Set(req.published),
            published_at: Set(req.published.then_some(now)),
            author_id: Set(author_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("创建公告失败: {e}")))?;

        self.hydrate_announcement(result).await
    }

    pub async fn get_announcement_by_id_impl(&self, id: i64) -> Result<Option<Announcement>> {
        let result = Announcements::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询公告失败: {e}")))?;

        match result {
            Some(m) => Ok(Some(self.hydrate_announcement(m).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_announcements_with_pagination_impl(
        &self,
        params: AnnouncementListParams,
    ) -> Result<AnnouncementListResponse> {
        let filter = params.filter;
        let mut select = Announcements::find();

        if let Some(ref search) = filter.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Title.like(like_contains(search)))
                    .add(Column::Body.like(like_contains(search))),
            );
        }

        if let Some(audience) = filter.audience {
            select = select.filter(Column::Audience.eq(audience.to_string()));
        }
        if let Some(published) = filter.published {
            select = select.filter(Column::Published.eq(published));
        }
        if let Some(ref visible) = filter.visible_audiences {
            select = select.filter(
                Column::Audience.is_in(visible.iter().map(|a| a.to_string()).collect::<Vec<_>>()),
            );
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let (models, pagination) = fetch_page(&self.db, select, &params.pagination, "公告").await?;

        Ok(AnnouncementListResponse {
            items: self.hydrate_announcements(models).await?,
            pagination,
        })
    }

    /// 首次发布时记录发布时间，之后不再变更
    pub async fn update_announcement_impl(
        &self,
        id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>> {
        let existing = Announcements::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询公告失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let now = now_ts();
        let first_publish = existing.published_at.is_none();
        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now);

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(body) = update.body {
            model.body = Set(body);
        }
        if let Some(audience) = update.audience {
            model.audience = Set(audience.to_string());
        }
        if let Some(published) = update.published {
            model.published = Set(published);
            if published && first_publish {
                model.published_at = Set(Some(now));
            }
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新公告失败: {e}")))?;

        Ok(Some(self.hydrate_announcement(result).await?))
    }

    pub async fn delete_announcement_impl(&self, id: i64) -> Result<bool> {
        let result = Announcements::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("删除公告失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
