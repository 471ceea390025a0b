use super::{SeaOrmStorage, fetch_page, now_ts};
use crate::entity::classes;
use crate::entity::prelude::Classes;
use crate::entity::teachers::{ActiveModel, Column, Entity as Teachers};
use crate::errors::{Result, SchoolError};
use crate::models::teachers::{
    entities::{Teacher, TeacherDetail, TeacherStatus},
    requests::{CreateTeacherRequest, TeacherListParams, UpdateTeacherRequest},
    responses::TeacherListResponse,
};
use crate::utils::like_contains;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn create_teacher_impl(&self, req: CreateTeacherRequest) -> Result<Teacher> {
        let now = now_ts();

        let model = ActiveModel {
            name: Set(req.name),
            email: Set(req.email),
            phone: Set(req.phone),
            subject: Set(req.subject),
            hired_on: Set(req.hired_on),
            status: Set(req.status.unwrap_or(TeacherStatus::Active).to_string()),
            user_id: Set(req.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("创建教师失败: {e}")))?;

        Ok(result.into_teacher())
    }

    pub async fn get_teacher_by_id_impl(&self, id: i64) -> Result<Option<Teacher>> {
        let result = Teachers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(result.map(|m| m.into_teacher()))
    }

    pub async fn get_teacher_by_email_impl(&self, email: &str) -> Result<Option<Teacher>> {
        let result = Teachers::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(result.map(|m| m.into_teacher()))
    }

    /// 教师详情，附带其负责的班级
    pub async fn get_teacher_detail_impl(&self, id: i64) -> Result<Option<TeacherDetail>> {
        let Some(teacher) = self.get_teacher_by_id_impl(id).await? else {
            return Ok(None);
        };

        let classes = Classes::find()
            .filter(classes::Column::TeacherId.eq(id))
            .order_by_desc(classes::Column::SchoolYear)
            .order_by_asc(classes::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询教师班级失败: {e}")))?;

        Ok(Some(TeacherDetail {
            teacher,
            classes: classes.into_iter().map(|m| m.into_summary()).collect(),
        }))
    }

    pub async fn list_teachers_with_pagination_impl(
        &self,
        params: TeacherListParams,
    ) -> Result<TeacherListResponse> {
        let filter = params.filter;
        let mut select = Teachers::find();

        if let Some(ref search) = filter.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Name.like(like_contains(search)))
                    .add(Column::Email.like(like_contains(search)))
                    .add(Column::Subject.like(like_contains(search))),
            );
        }

        if let Some(status) = filter.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_asc(Column::Name).order_by_asc(Column::Id);

        let (teachers, pagination) =
            fetch_page(&self.db, select, &params.pagination, "教师").await?;

        Ok(TeacherListResponse {
            items: teachers.into_iter().map(|m| m.into_teacher()).collect(),
            pagination,
        })
    }

    pub async fn update_teacher_impl(
        &self,
        id: i64,
        update: UpdateTeacherRequest,
    ) -> Result<Option<Teacher>> {
        let existing = Teachers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询教师失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(phone) = update.phone {
            model.phone = Set(phone);
        }
        if let Some(subject) = update.subject {
            model.subject = Set(subject);
        }
        if let Some(hired_on) = update.hired_on {
            model.hired_on = Set(hired_on);
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(user_id) = update.user_id {
            model.user_id = Set(user_id);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新教师失败: {e}")))?;

        Ok(Some(result.into_teacher()))
    }

    /// 删除教师，其负责的班级变为无教师
    pub async fn delete_teacher_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;

        Classes::update_many()
            .col_expr(classes::Column::TeacherId, Expr::value(Option::<i64>::None))
            .col_expr(classes::Column::UpdatedAt, Expr::value(now_ts()))
            .filter(classes::Column::TeacherId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("解除班级教师失败: {e}")))?;

        let result = Teachers::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("删除教师失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SchoolError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
