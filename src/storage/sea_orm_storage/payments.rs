use super::transactions::insert_transaction;
use super::{SeaOrmStorage, collect_ids, fetch_page, now_ts};
use crate::entity::payments::{ActiveModel, Column, Entity as Payments, Model};
use crate::entity::prelude::Students;
use crate::entity::students;
use crate::errors::{Result, SchoolError};
use crate::models::finance::{
    entities::{PaymentRecord, PaymentStatus, TUITION_CATEGORY, Transaction, TransactionKind},
    requests::{
        CreatePaymentRequest, NewTransaction, PaymentListParams, PaymentSettlement,
        UpdatePaymentRequest,
    },
    responses::{GenerateChargesResponse, PaymentListResponse},
};
use crate::models::students::entities::StudentStatus;
use crate::storage::MonthlyChargePlan;
use crate::utils::dates;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::collections::HashSet;

/// 收款时间：当天收款记当前时刻，补登记录为付款日零点
fn paid_at_for(paid_on: &str) -> Result<i64> {
    let date = dates::parse_date(paid_on)?;
    if date == dates::today() {
        return Ok(now_ts());
    }
    Ok(date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_else(now_ts))
}

fn parse_status(model: &Model) -> PaymentStatus {
    model
        .status
        .parse::<PaymentStatus>()
        .unwrap_or(PaymentStatus::Pending)
}

/// 可以迁移到 next 的所有状态
fn statuses_allowing(next: PaymentStatus) -> Vec<String> {
    PaymentStatus::ALL
        .iter()
        .filter(|s| s.can_transition_to(next))
        .map(|s| s.to_string())
        .collect()
}

fn open_statuses() -> Vec<String> {
    PaymentStatus::ALL
        .iter()
        .filter(|s| s.is_open())
        .map(|s| s.to_string())
        .collect()
}

/// 带状态条件的更新
///
/// 判断与写入在同一条 UPDATE 中完成，并发请求只有一个能命中。
/// 未命中时重新读取：记录不存在返回 `Ok(None)`，否则按当前状态返回 InvalidState。
async fn guarded_update<C, F>(
    db: &C,
    id: i64,
    model: ActiveModel,
    allowed: Vec<String>,
    rejected: F,
) -> Result<Option<Model>>
where
    C: ConnectionTrait,
    F: FnOnce(PaymentStatus) -> String,
{
    let result = Payments::update_many()
        .set(model)
        .filter(Column::Id.eq(id))
        .filter(Column::Status.is_in(allowed))
        .exec(db)
        .await
        .map_err(|e| SchoolError::database_operation(format!("更新收费记录失败: {e}")))?;

    let current = Payments::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询收费记录失败: {e}")))?;

    match current {
        None => Ok(None),
        Some(model) if result.rows_affected == 0 => {
            Err(SchoolError::invalid_state(rejected(parse_status(&model))))
        }
        Some(model) => Ok(Some(model)),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl SeaOrmStorage {
    pub(crate) async fn hydrate_payments(&self, models: Vec<Model>) -> Result<Vec<PaymentRecord>> {
        let student_names = self
            .load_student_names(collect_ids(&models, |m| Some(m.student_id)))
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let student_name = student_names.get(&m.student_id).cloned();
                m.into_payment(student_name)
            })
            .collect())
    }

    async fn hydrate_payment(&self, model: Model) -> Result<PaymentRecord> {
        self.hydrate_payments(vec![model])
            .await?
            .pop()
            .ok_or_else(|| SchoolError::database_operation("读取收费记录失败"))
    }

    pub async fn create_payment_impl(&self, req: CreatePaymentRequest) -> Result<PaymentRecord> {
        let now = now_ts();

        let model = ActiveModel {
            student_id: Set(req.student_id),
            description: Set(req.description),
            reference_month: Set(req.reference_month),
            amount_cents: Set(req.amount_cents),
            due_date: Set(req.due_date),
            status: Set(PaymentStatus::Pending.to_string()),
            paid_at: Set(None),
            paid_amount_cents: Set(None),
            late_fee_cents: Set(0),
            interest_cents: Set(0),
            payment_method: Set(None),
            notes: Set(req.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("创建收费记录失败: {e}")))?;

        self.hydrate_payment(result).await
    }

    pub async fn get_payment_by_id_impl(&self, id: i64) -> Result<Option<PaymentRecord>> {
        let result = Payments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询收费记录失败: {e}")))?;

        match result {
            Some(m) => Ok(Some(self.hydrate_payment(m).await?)),
            None => Ok(None),
        }
    }

    /// 按到期日升序分页
    pub async fn list_payments_with_pagination_impl(
        &self,
        params: PaymentListParams,
    ) -> Result<PaymentListResponse> {
        let filter = params.filter;
        let mut select = Payments::find();

        if let Some(student_id) = filter.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }
        if let Some(status) = filter.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }
        if let Some(ref month) = filter.reference_month {
            select = select.filter(Column::ReferenceMonth.eq(month.as_str()));
        }
        if let Some(ref from) = filter.from {
            select = select.filter(Column::DueDate.gte(from.as_str()));
        }
        if let Some(ref to) = filter.to {
            select = select.filter(Column::DueDate.lte(to.as_str()));
        }

        select = select.order_by_asc(Column::DueDate).order_by_asc(Column::Id);

        let (models, pagination) =
            fetch_page(&self.db, select, &params.pagination, "收费记录").await?;

        Ok(PaymentListResponse {
            items: self.hydrate_payments(models).await?,
            pagination,
        })
    }

    /// 仅 pending 与 overdue 状态可修改
    pub async fn update_payment_impl(
        &self,
        id: i64,
        update: UpdatePaymentRequest,
    ) -> Result<Option<PaymentRecord>> {
        let mut model = ActiveModel {
            updated_at: Set(now_ts()),
            ..Default::default()
        };

        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(reference_month) = update.reference_month {
            model.reference_month = Set(reference_month);
        }
        if let Some(amount_cents) = update.amount_cents {
            model.amount_cents = Set(amount_cents);
        }
        if let Some(due_date) = update.due_date {
            model.due_date = Set(due_date);
        }
        if let Some(notes) = update.notes {
            model.notes = Set(notes);
        }

        let updated = guarded_update(&self.db, id, model, open_statuses(), |status| {
            format!("状态为 {status} 的收费记录不可修改")
        })
        .await?;

        match updated {
            Some(m) => Ok(Some(self.hydrate_payment(m).await?)),
            None => Ok(None),
        }
    }

    /// 将到期日早于 today 的待缴记录标记为逾期
    pub async fn mark_overdue_payments_impl(&self, today: &str) -> Result<u64> {
        let result = Payments::update_many()
            .col_expr(Column::Status, Expr::value(PaymentStatus::Overdue.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Status.eq(PaymentStatus::Pending.to_string()))
            .filter(Column::DueDate.lt(today))
            .exec(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新逾期状态失败: {e}")))?;

        Ok(result.rows_affected)
    }

    /// 收款：同一事务内更新收费记录并写入收入流水
    pub async fn settle_payment_impl(
        &self,
        id: i64,
        settlement: PaymentSettlement,
    ) -> Result<Option<(PaymentRecord, Transaction)>> {
        let paid_at = paid_at_for(&settlement.paid_on)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;

        let model = ActiveModel {
            status: Set(PaymentStatus::Paid.to_string()),
            paid_at: Set(Some(paid_at)),
            paid_amount_cents: Set(Some(settlement.paid_amount_cents)),
            late_fee_cents: Set(settlement.late_fee_cents),
            interest_cents: Set(settlement.interest_cents),
            payment_method: Set(Some(settlement.payment_method.to_string())),
            notes: match settlement.notes {
                Some(notes) => Set(Some(notes)),
                None => NotSet,
            },
            updated_at: Set(now_ts()),
            ..Default::default()
        };

        let payment = guarded_update(
            &txn,
            id,
            model,
            statuses_allowing(PaymentStatus::Paid),
            |status| format!("收费记录状态为 {status}，无法收款"),
        )
        .await?;
        let Some(payment) = payment else {
            return Ok(None);
        };

        let student_id = payment.student_id;
        let description = payment.description.clone();

        let transaction = insert_transaction(
            &txn,
            NewTransaction {
                kind: TransactionKind::Income,
                category: TUITION_CATEGORY.to_string(),
                description: Some(description),
                amount_cents: settlement.paid_amount_cents,
                occurred_on: settlement.paid_on,
                student_id: Some(student_id),
                payment_id: Some(id),
                created_by: settlement.settled_by,
            },
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| SchoolError::database_operation(format!("提交事务失败: {e}")))?;

        let payment = self.hydrate_payment(payment).await?;
        let transaction = self.hydrate_transaction(transaction).await?;

        Ok(Some((payment, transaction)))
    }

    /// 状态迁移，非法迁移返回 InvalidState
    pub async fn transition_payment_impl(
        &self,
        id: i64,
        next: PaymentStatus,
    ) -> Result<Option<PaymentRecord>> {
        let model = ActiveModel {
            status: Set(next.to_string()),
            updated_at: Set(now_ts()),
            ..Default::default()
        };

        let updated = guarded_update(&self.db, id, model, statuses_allowing(next), |current| {
            format!("{current} -> {next}")
        })
        .await?;

        match updated {
            Some(m) => Ok(Some(self.hydrate_payment(m).await?)),
            None => Ok(None),
        }
    }

    /// 为在读学生批量生成当月学费，已有未取消记录的学生跳过
    pub async fn generate_monthly_charges_impl(
        &self,
        plan: MonthlyChargePlan,
    ) -> Result<GenerateChargesResponse> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;

        let mut select = Students::find()
            .filter(students::Column::Status.eq(StudentStatus::Active.to_string()));
        if let Some(class_id) = plan.class_id {
            select = select.filter(students::Column::ClassId.eq(class_id));
        }
        let student_ids: Vec<i64> = select
            .order_by_asc(students::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询在读学生失败: {e}")))?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let mut response = GenerateChargesResponse {
            reference_month: plan.reference_month.clone(),
            ..Default::default()
        };
        if student_ids.is_empty() {
            return Ok(response);
        }

        let charged: HashSet<i64> = Payments::find()
            .filter(Column::ReferenceMonth.eq(plan.reference_month.as_str()))
            .filter(Column::Status.ne(PaymentStatus::Cancelled.to_string()))
            .filter(Column::StudentId.is_in(student_ids.clone()))
            .all(&txn)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询已有收费记录失败: {e}")))?
            .into_iter()
            .map(|m| m.student_id)
            .collect();

        let now = now_ts();
        for student_id in student_ids {
            if charged.contains(&student_id) {
                response.skipped += 1;
                continue;
            }

            let model = ActiveModel {
                student_id: Set(student_id),
                description: Set(plan.description.clone()),
                reference_month: Set(Some(plan.reference_month.clone())),
                amount_cents: Set(plan.amount_cents),
                due_date: Set(plan.due_date.clone()),
                status: Set(PaymentStatus::Pending.to_string()),
                paid_at: Set(None),
                paid_amount_cents: Set(None),
                late_fee_cents: Set(0),
                interest_cents: Set(0),
                payment_method: Set(None),
                notes: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            // 每条记录在保存点内插入，唯一索引冲突说明并发请求已生成
            let savepoint = txn
                .begin()
                .await
                .map_err(|e| SchoolError::database_operation(format!("开始事务失败: {e}")))?;
            match model.insert(&savepoint).await {
                Ok(_) => {
                    savepoint.commit().await.map_err(|e| {
                        SchoolError::database_operation(format!("提交事务失败: {e}"))
                    })?;
                    response.created += 1;
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await.map_err(|e| {
                        SchoolError::database_operation(format!("回滚事务失败: {e}"))
                    })?;
                    response.skipped += 1;
                }
                Err(e) => {
                    return Err(SchoolError::database_operation(format!(
                        "生成收费记录失败: {e}"
                    )));
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| SchoolError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(response)
    }
}
