//! 收费记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub description: String,
    pub reference_month: Option<String>,
    pub amount_cents: i64,
    pub due_date: String,
    pub status: String,
    pub paid_at: Option<i64>,
    pub paid_amount_cents: Option<i64>,
    pub late_fee_cents: i64,
    pub interest_cents: i64,
    pub payment_method: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_payment(
        self,
        student_name: Option<String>,
    ) -> crate::models::finance::entities::PaymentRecord {
        use crate::models::finance::entities::{PaymentMethod, PaymentRecord, PaymentStatus};
        use chrono::{DateTime, Utc};

        PaymentRecord {
            id: self.id,
            student_id: self.student_id,
            student_name,
            description: self.description,
            reference_month: self.reference_month,
            amount_cents: self.amount_cents,
            due_date: self.due_date,
            status: self
                .status
                .parse::<PaymentStatus>()
                .unwrap_or(PaymentStatus::Pending),
            paid_at: self
                .paid_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            paid_amount_cents: self.paid_amount_cents,
            late_fee_cents: self.late_fee_cents,
            interest_cents: self.interest_cents,
            payment_method: self
                .payment_method
                .and_then(|m| m.parse::<PaymentMethod>().ok()),
            notes: self.notes,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
