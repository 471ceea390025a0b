//! 财务汇总与首页概览

use super::SeaOrmStorage;
use crate::entity::prelude::{Classes, Payments, Students, Teachers, Transactions};
use crate::entity::{classes, payments, students, teachers, transactions};
use crate::errors::{Result, SchoolError};
use crate::models::dashboard::responses::{ClassOccupancy, DashboardOverview};
use crate::models::finance::entities::{PaymentStatus, TransactionKind};
use crate::models::finance::responses::{CategoryTotal, FinanceSummary, MonthlyTotal};
use crate::models::students::entities::StudentStatus;
use crate::models::teachers::entities::TeacherStatus;
use crate::utils::money::sum_cents;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::collections::BTreeMap;

/// (kind, category, amount_cents, occurred_on)
type TransactionRow = (String, String, i64, String);

/// 区间内的流水，只取汇总所需的列
async fn transaction_rows(
    db: &DatabaseConnection,
    from: &str,
    to: &str,
) -> Result<Vec<TransactionRow>> {
    Transactions::find()
        .select_only()
        .column(transactions::Column::Kind)
        .column(transactions::Column::Category)
        .column(transactions::Column::AmountCents)
        .column(transactions::Column::OccurredOn)
        .filter(transactions::Column::OccurredOn.gte(from))
        .filter(transactions::Column::OccurredOn.lte(to))
        .into_tuple()
        .all(db)
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询流水失败: {e}")))
}

/// 逾期记录的数量与金额合计
async fn overdue_totals(db: &DatabaseConnection) -> Result<(i64, i64)> {
    let amounts: Vec<i64> = Payments::find()
        .select_only()
        .column(payments::Column::AmountCents)
        .filter(payments::Column::Status.eq(PaymentStatus::Overdue.to_string()))
        .into_tuple()
        .all(db)
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询逾期收费失败: {e}")))?;

    Ok((amounts.len() as i64, sum_cents(amounts.iter().copied())?))
}

fn is_income(kind: &str) -> bool {
    matches!(kind.parse::<TransactionKind>(), Ok(TransactionKind::Income))
}

/// 汇总收支：总额、按分类、按月
///
/// 累加在 i128 上进行，结果超出 i64 时返回校验错误。
fn summarize(
    rows: &[TransactionRow],
) -> Result<(i64, i64, Vec<CategoryTotal>, Vec<MonthlyTotal>)> {
    let mut income = 0i128;
    let mut expense = 0i128;
    let mut by_category: BTreeMap<(String, String), i128> = BTreeMap::new();
    let mut monthly: BTreeMap<String, (i128, i128)> = BTreeMap::new();

    for (kind, category, amount, occurred_on) in rows {
        let amount = i128::from(*amount);
        let month = occurred_on.get(..7).unwrap_or(occurred_on).to_string();
        let entry = monthly.entry(month).or_default();
        if is_income(kind) {
            income += amount;
            entry.0 += amount;
        } else {
            expense += amount;
            entry.1 += amount;
        }
        *by_category
            .entry((kind.clone(), category.clone()))
            .or_default() += amount;
    }

    let mut categories = Vec::with_capacity(by_category.len());
    for ((kind, category), total) in by_category {
        if let Ok(kind) = kind.parse::<TransactionKind>() {
            categories.push(CategoryTotal {
                kind,
                category,
                total_cents: narrow(total)?,
            });
        }
    }

    let mut months = Vec::with_capacity(monthly.len());
    for (month, (income_cents, expense_cents)) in monthly {
        months.push(MonthlyTotal {
            month,
            income_cents: narrow(income_cents)?,
            expense_cents: narrow(expense_cents)?,
        });
    }

    Ok((narrow(income)?, narrow(expense)?, categories, months))
}

fn narrow(total: i128) -> Result<i64> {
    i64::try_from(total)
        .map_err(|_| SchoolError::validation(format!("Amount total out of range: {total}")))
}

impl SeaOrmStorage {
    pub async fn finance_summary_impl(&self, from: &str, to: &str) -> Result<FinanceSummary> {
        let rows = transaction_rows(&self.db, from, to).await?;
        let (total_income_cents, total_expense_cents, by_category, monthly) = summarize(&rows)?;

        let pending: Vec<i64> = Payments::find()
            .select_only()
            .column(payments::Column::AmountCents)
            .filter(payments::Column::Status.eq(PaymentStatus::Pending.to_string()))
            .filter(payments::Column::DueDate.gte(from))
            .filter(payments::Column::DueDate.lte(to))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询待缴收费失败: {e}")))?;

        let (overdue_count, overdue_receivables_cents) = overdue_totals(&self.db).await?;

        Ok(FinanceSummary {
            from: from.to_string(),
            to: to.to_string(),
            total_income_cents,
            total_expense_cents,
            balance_cents: narrow(
                i128::from(total_income_cents) - i128::from(total_expense_cents),
            )?,
            by_category,
            monthly,
            pending_receivables_cents: sum_cents(pending)?,
            overdue_receivables_cents,
            overdue_count,
        })
    }

    pub async fn dashboard_overview_impl(
        &self,
        month_from: &str,
        month_to: &str,
    ) -> Result<DashboardOverview> {
        let count_err = |label: &str, e: sea_orm::DbErr| {
            SchoolError::database_operation(format!("统计{label}失败: {e}"))
        };

        let total_students = Students::find()
            .count(&self.db)
            .await
            .map_err(|e| count_err("学生", e))?;
        let active_students = Students::find()
            .filter(students::Column::Status.eq(StudentStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| count_err("在读学生", e))?;
        let total_teachers = Teachers::find()
            .count(&self.db)
            .await
            .map_err(|e| count_err("教师", e))?;
        let active_teachers = Teachers::find()
            .filter(teachers::Column::Status.eq(TeacherStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| count_err("在职教师", e))?;

        let class_models = Classes::find()
            .order_by_asc(classes::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| count_err("班级", e))?;
        let counts = self
            .load_enrolled_counts(class_models.iter().map(|m| m.id).collect())
            .await?;
        let class_occupancy: Vec<ClassOccupancy> = class_models
            .into_iter()
            .map(|m| ClassOccupancy {
                class_id: m.id,
                enrolled: counts.get(&m.id).copied().unwrap_or(0),
                name: m.name,
                capacity: m.capacity,
            })
            .collect();

        let rows = transaction_rows(&self.db, month_from, month_to).await?;
        let (month_income_cents, month_expense_cents, _, _) = summarize(&rows)?;
        let (overdue_payments, overdue_amount_cents) = overdue_totals(&self.db).await?;

        Ok(DashboardOverview {
            total_students: total_students as i64,
            active_students: active_students as i64,
            total_classes: class_occupancy.len() as i64,
            total_teachers: total_teachers as i64,
            active_teachers: active_teachers as i64,
            month: month_from.get(..7).unwrap_or(month_from).to_string(),
            month_income_cents,
            month_expense_cents,
            month_balance_cents: narrow(
                i128::from(month_income_cents) - i128::from(month_expense_cents),
            )?,
            overdue_payments,
            overdue_amount_cents,
            class_occupancy,
            generated_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, category: &str, amount: i64, date: &str) -> TransactionRow {
        (kind.into(), category.into(), amount, date.into())
    }

    #[test]
    fn test_summarize_groups_by_category_and_month() {
        let rows = vec![
            row("income", "tuition", 50_000, "2025-03-05"),
            row("income", "tuition", 50_000, "2025-04-05"),
            row("expense", "salary", 30_000, "2025-03-30"),
            row("expense", "supplies", 1_250, "2025-04-02"),
        ];

        let (income, expense, by_category, monthly) = summarize(&rows).unwrap();
        assert_eq!(income, 100_000);
        assert_eq!(expense, 31_250);

        assert_eq!(by_category.len(), 3);
        let tuition = by_category
            .iter()
            .find(|c| c.category == "tuition")
            .unwrap();
        assert_eq!(tuition.kind, TransactionKind::Income);
        assert_eq!(tuition.total_cents, 100_000);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, "2025-03");
        assert_eq!(monthly[0].income_cents, 50_000);
        assert_eq!(monthly[0].expense_cents, 30_000);
        assert_eq!(monthly[1].month, "2025-04");
        assert_eq!(monthly[1].expense_cents, 1_250);
    }

    #[test]
    fn test_summarize_rejects_out_of_range_totals() {
        let half = i64::MAX / 2 + 1;
        let rows = vec![
            row("income", "donation", half, "2025-03-05"),
            row("income", "donation", half, "2025-03-06"),
        ];
        let err = summarize(&rows).unwrap_err();
        assert!(matches!(err, SchoolError::Validation(_)));
    }

    #[test]
    fn test_summarize_empty() {
        let (income, expense, by_category, monthly) = summarize(&[]).unwrap();
        assert_eq!((income, expense), (0, 0));
        assert!(by_category.is_empty());
        assert!(monthly.is_empty());
    }
}
