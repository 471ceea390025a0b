use super::{SeaOrmStorage, collect_ids, fetch_page, now_ts};
use crate::entity::transactions::{ActiveModel, Column, Entity as Transactions, Model};
use crate::errors::{Result, SchoolError};
use crate::models::finance::{
    entities::Transaction,
    requests::{NewTransaction, TransactionFilter, TransactionListParams, UpdateTransactionRequest},
    responses::TransactionListResponse,
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Select, Set,
};

fn filtered_select(filter: &TransactionFilter) -> Select<Transactions> {
    let mut select = Transactions::find();

    if let Some(ref search) = filter.search
        && !search.trim().is_empty()
    {
        select = select.filter(
            Condition::any()
                .add(Column::Category.like(like_contains(search)))
                .add(Column::Description.like(like_contains(search))),
        );
    }

    if let Some(kind) = filter.kind {
        select = select.filter(Column::Kind.eq(kind.to_string()));
    }
    if let Some(ref category) = filter.category
        && !category.trim().is_empty()
    {
        select = select.filter(Column::Category.eq(category.trim()));
    }
    if let Some(student_id) = filter.student_id {
        select = select.filter(Column::StudentId.eq(student_id));
    }
    // ISO 日期字符串可直接按字典序比较
    if let Some(ref from) = filter.from {
        select = select.filter(Column::OccurredOn.gte(from.as_str()));
    }
    if let Some(ref to) = filter.to {
        select = select.filter(Column::OccurredOn.lte(to.as_str()));
    }

    select
        .order_by_desc(Column::OccurredOn)
        .order_by_desc(Column::Id)
}

/// 在给定连接（或事务）上插入流水
pub(crate) async fn insert_transaction<C: ConnectionTrait>(
    conn: &C,
    tx: NewTransaction,
) -> Result<Model> {
    let now = now_ts();

    let model = ActiveModel {
        kind: Set(tx.kind.to_string()),
        category: Set(tx.category),
        description: Set(tx.description),
        amount_cents: Set(tx.amount_cents),
        occurred_on: Set(tx.occurred_on),
        student_id: Set(tx.student_id),
        payment_id: Set(tx.payment_id),
        created_by: Set(tx.created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    model
        .insert(conn)
        .await
        .map_err(|e| SchoolError::database_operation(format!("创建流水失败: {e}")))
}

impl SeaOrmStorage {
    pub(crate) async fn hydrate_transactions(&self, models: Vec<Model>) -> Result<Vec<Transaction>> {
        let student_names = self
            .load_student_names(collect_ids(&models, |m| m.student_id))
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let student_name = m.student_id.and_then(|id| student_names.get(&id).cloned());
                m.into_transaction(student_name)
            })
            .collect())
    }

    pub(crate) async fn hydrate_transaction(&self, model: Model) -> Result<Transaction> {
        self.hydrate_transactions(vec![model])
            .await?
            .pop()
            .ok_or_else(|| SchoolError::database_operation("读取流水失败"))
    }

    pub async fn create_transaction_impl(&self, tx: NewTransaction) -> Result<Transaction> {
        let model = insert_transaction(&self.db, tx).await?;
        self.hydrate_transaction(model).await
    }

    pub async fn get_transaction_by_id_impl(&self, id: i64) -> Result<Option<Transaction>> {
        let result = Transactions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询流水失败: {e}")))?;

        match result {
            Some(m) => Ok(Some(self.hydrate_transaction(m).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_transactions_with_pagination_impl(
        &self,
        params: TransactionListParams,
    ) -> Result<TransactionListResponse> {
        let select = filtered_select(&params.filter);
        let (models, pagination) = fetch_page(&self.db, select, &params.pagination, "流水").await?;

        Ok(TransactionListResponse {
            items: self.hydrate_transactions(models).await?,
            pagination,
        })
    }

    pub async fn list_transactions_impl(&self, filter: TransactionFilter) -> Result<Vec<Transaction>> {
        let models = filtered_select(&filter)
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询流水列表失败: {e}")))?;

        self.hydrate_transactions(models).await
    }

    pub async fn update_transaction_impl(
        &self,
        id: i64,
        update: UpdateTransactionRequest,
    ) -> Result<Option<Transaction>> {
        let existing = Transactions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询流水失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(None);
        };
        if existing.payment_id.is_some() {
            return Err(SchoolError::conflict("由收费记录生成的流水不可修改"));
        }

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(kind) = update.kind {
            model.kind = Set(kind.to_string());
        }
        if let Some(category) = update.category {
            model.category = Set(category);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(amount_cents) = update.amount_cents {
            model.amount_cents = Set(amount_cents);
        }
        if let Some(occurred_on) = update.occurred_on {
            model.occurred_on = Set(occurred_on);
        }
        if let Some(student_id) = update.student_id {
            model.student_id = Set(student_id);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("更新流水失败: {e}")))?;

        Ok(Some(self.hydrate_transaction(result).await?))
    }

    pub async fn delete_transaction_impl(&self, id: i64) -> Result<bool> {
        let existing = Transactions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询流水失败: {e}")))?;
        let Some(existing) = existing else {
            return Ok(false);
        };
        if existing.payment_id.is_some() {
            return Err(SchoolError::conflict("由收费记录生成的流水不可删除"));
        }

        let result = Transactions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("删除流水失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
