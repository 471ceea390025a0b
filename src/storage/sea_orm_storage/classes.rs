use super::{SeaOrmStorage, collect_ids, fetch_page, now_ts};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes, Model};
use crate::entity::prelude::Students;
use crate::entity::students;
use crate::errors::{Result, SchoolError};
use crate::models::{
    PaginationQuery,
    classes::{
        entities::Class,
        requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    students::{entities::StudentStatus, responses::StudentListResponse},
};
use crate::utils::like_contains;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 将班级模型补全教师姓名与在读人数
    async fn hydrate_classes(&self, models: Vec<Model>) -> Result<Vec<Class>> {
        let teacher_names = self
            .load_teacher_names(collect_ids(&models, |m| m.teacher_id))
            .await?;
        let counts = self
            .load_enrolled_counts(models.iter().map(|m| m.id).collect())
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let teacher_name = m.teacher_id.and_then(|id| teacher_names.get(&id).cloned());
                let enrolled = counts.get(&m.id).copied().unwrap_or(0);
                m.into_class(teacher_name, enrolled)
            })
            .collect())
    }

    async fn hydrate_class(&self, model: Option<Model>) -> Result<Option<Class>> {
        match model {
            Some(m) => Ok(self.hydrate_classes(vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = now_ts();

        let model = ActiveModel {
            name: Set(req.name),
            grade_level: Set(req.grade_level),
            shift: Set(req.shift.to_string()),
            school_year: Set(req.school_year),
            capacity: Set(req.capacity),
            teacher_id: Set(req.teacher_id),
            room: Set(req.room),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("创建班级失败: {e}")))?;

        self.hydrate_class(Some(result))
            .await?
            .ok_or_else(|| SchoolError::database_operation("创建班级后读取失败"))
    }

    pub async fn get_class_by_id_impl(&self, id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询班级失败: {e}")))?;

        self.hydrate_class(result).await
    }

    pub async fn get_class_by_name_impl(&self, name: &str) -> Result<Option<Class>> {
        let result = Classes::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询班级失败: {e}")))?;

        self.hydrate_class(result).await
    }

    pub async fn list_classes_with_pagination_impl(
        &self,
        params: ClassListParams,
    ) -> Result<ClassListResponse> {
        let filter = params.filter;
        let mut select = Classes::find();

        if let Some(ref search) = filter.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Name.like(like_contains(search)))
                    .add(Column::GradeLevel.like(like_contains(search)))
                    .add(Column::Room.like(like_contains(search))),
            );
        }

        if let Some(school_year) = filter.school_year {
            select = select.filter(Column::SchoolYear.eq(school_year));
        }
        if let Some(shift) = filter.shift {
            select = select.filter(Column::Shift.eq(shift.to_string()));
        }
        if let Some(teacher_id) = filter.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        select = select
            .order_by_desc(Column::SchoolYear)
            .order_by_asc(Column::Name);

        let (models, pagination) = fetch_page(&self.db, select, &params.pagination, "班级").await?;

        Ok(ClassListResponse {
            items: self.hydrate_classes(models).await?,
            pagination,
        })
    }

    pub async fn update_class_impl(
        &self,
        id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        let existing = Classes::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询班级失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(grade_level) = update.grade_level {
            model.grade_level = Set(grade_level);
        }
        if let Some(shift) = update.shift {
            model.shift = Set(shift.to_string());
        }
        if let Some(school_year) = update.school_year {
            model.school_year = Set(school_year);
        }
        if let Some(capacity) = update.capacity {
            model.capacity = Set(capacity);
        }
        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(teacher_id);
        }
        if let Some(room) = update.room {
            model.room = Set(room);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新班级失败: {e}")))?;

        self.hydrate_class(Some(result)).await
    }

    /// 删除班级，班内学生移出班级
    pub async fn delete_class_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;

        Students::update_many()
            .col_expr(students::Column::ClassId, Expr::value(Option::<i64>::None))
            .col_expr(students::Column::UpdatedAt, Expr::value(now_ts()))
            .filter(students::Column::ClassId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("移出班级学生失败: {e}")))?;

        let result = Classes::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("删除班级失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SchoolError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 班级学生，按姓名排序
    pub async fn list_class_students_impl(
        &self,
        class_id: i64,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse> {
        let select = Students::find()
            .filter(students::Column::ClassId.eq(class_id))
            .order_by_asc(students::Column::Name)
            .order_by_asc(students::Column::Id);

        let (models, pagination) = fetch_page(&self.db, select, &pagination, "班级学生").await?;
        let class_names = self.load_class_names(vec![class_id]).await?;
        let class_name = class_names.get(&class_id).cloned();

        Ok(StudentListResponse {
            items: models
                .into_iter()
                .map(|m| m.into_student(class_name.clone()))
                .collect(),
            pagination,
        })
    }

    pub async fn count_active_students_in_class_impl(&self, class_id: i64) -> Result<i64> {
        let count = Students::find()
            .filter(students::Column::ClassId.eq(class_id))
            .filter(students::Column::Status.eq(StudentStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("统计班级人数失败: {e}")))?;

        Ok(count as i64)
    }
}
