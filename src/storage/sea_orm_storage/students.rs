use super::{SeaOrmStorage, collect_ids, fetch_page, now_ts};
use crate::entity::prelude::{Payments, Transactions};
use crate::entity::students::{ActiveModel, Column, Entity as Students, Model};
use crate::entity::{payments, transactions};
use crate::errors::{Result, SchoolError};
use crate::models::common::SortOrder;
use crate::models::students::{
    entities::{Student, StudentSortBy, StudentStatus},
    requests::{CreateStudentRequest, StudentFilter, StudentListParams, UpdateStudentRequest},
    responses::StudentListResponse,
};
use crate::utils::like_contains;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};

/// 按过滤条件构造查询，列表与导出共用
fn filtered_select(filter: &StudentFilter) -> Select<Students> {
    let mut select = Students::find();

    if let Some(ref search) = filter.search
        && !search.trim().is_empty()
    {
        select = select.filter(
            Condition::any()
                .add(Column::Name.like(like_contains(search)))
                .add(Column::EnrollmentNumber.like(like_contains(search)))
                .add(Column::GuardianName.like(like_contains(search))),
        );
    }

    if let Some(class_id) = filter.class_id {
        select = select.filter(Column::ClassId.eq(class_id));
    }
    if let Some(status) = filter.status {
        select = select.filter(Column::Status.eq(status.to_string()));
    }

    let order = match filter.order.unwrap_or_default() {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let column = match filter.sort_by.unwrap_or(StudentSortBy::Name) {
        StudentSortBy::Name => Column::Name,
        StudentSortBy::EnrollmentNumber => Column::EnrollmentNumber,
        StudentSortBy::CreatedAt => Column::CreatedAt,
    };

    select.order_by(column, order.clone()).order_by(Column::Id, order)
}

impl SeaOrmStorage {
    async fn hydrate_students(&self, models: Vec<Model>) -> Result<Vec<Student>> {
        let class_names = self
            .load_class_names(collect_ids(&models, |m| m.class_id))
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let class_name = m.class_id.and_then(|id| class_names.get(&id).cloned());
                m.into_student(class_name)
            })
            .collect())
    }

    async fn hydrate_student(&self, model: Option<Model>) -> Result<Option<Student>> {
        match model {
            Some(m) => Ok(self.hydrate_students(vec![m]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = now_ts();
        let enrollment_number = req
            .enrollment_number
            .ok_or_else(|| SchoolError::validation("缺少学号"))?;

        let model = ActiveModel {
            enrollment_number: Set(enrollment_number),
            name: Set(req.name),
            birth_date: Set(req.birth_date),
            email: Set(req.email),
            phone: Set(req.phone),
            guardian_name: Set(req.guardian_name),
            guardian_phone: Set(req.guardian_phone),
            address: Set(req.address),
            class_id: Set(req.class_id),
            status: Set(req.status.unwrap_or(StudentStatus::Active).to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("创建学生失败: {e}")))?;

        self.hydrate_student(Some(result))
            .await?
            .ok_or_else(|| SchoolError::database_operation("创建学生后读取失败"))
    }

    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询学生失败: {e}")))?;

        self.hydrate_student(result).await
    }

    pub async fn get_student_by_enrollment_number_impl(
        &self,
        number: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::EnrollmentNumber.eq(number))
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询学生失败: {e}")))?;

        self.hydrate_student(result).await
    }

    pub async fn list_students_with_pagination_impl(
        &self,
        params: StudentListParams,
    ) -> Result<StudentListResponse> {
        let select = filtered_select(&params.filter);
        let (models, pagination) = fetch_page(&self.db, select, &params.pagination, "学生").await?;

        Ok(StudentListResponse {
            items: self.hydrate_students(models).await?,
            pagination,
        })
    }

    /// 不分页列出学生
    pub async fn list_students_impl(&self, filter: StudentFilter) -> Result<Vec<Student>> {
        let models = filtered_select(&filter)
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询学生列表失败: {e}")))?;

        self.hydrate_students(models).await
    }

    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        let existing = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询学生失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(enrollment_number) = update.enrollment_number {
            model.enrollment_number = Set(enrollment_number);
        }
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(birth_date) = update.birth_date {
            model.birth_date = Set(birth_date);
        }
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(phone) = update.phone {
            model.phone = Set(phone);
        }
        if let Some(guardian_name) = update.guardian_name {
            model.guardian_name = Set(guardian_name);
        }
        if let Some(guardian_phone) = update.guardian_phone {
            model.guardian_phone = Set(guardian_phone);
        }
        if let Some(address) = update.address {
            model.address = Set(address);
        }
        if let Some(class_id) = update.class_id {
            model.class_id = Set(class_id);
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新学生失败: {e}")))?;

        self.hydrate_student(Some(result)).await
    }

    /// 删除学生，保留其历史流水但解除关联
    pub async fn delete_student_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;

        Transactions::update_many()
            .col_expr(
                transactions::Column::StudentId,
                Expr::value(Option::<i64>::None),
            )
            .filter(transactions::Column::StudentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("解除流水关联失败: {e}")))?;

        let result = Students::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("删除学生失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SchoolError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_student_payments_impl(&self, student_id: i64) -> Result<u64> {
        Payments::find()
            .filter(payments::Column::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("统计学生收费记录失败: {e}")))
    }
}
