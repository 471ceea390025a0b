//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub grade_level: String,
    pub shift: String,
    pub school_year: i32,
    pub capacity: i32,
    pub teacher_id: Option<i64>,
    pub room: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teachers::Entity",
        from = "Column::TeacherId",
        to = "super::teachers::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::students::Entity")]
    Students,
}

impl Related<super::teachers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务模型，教师姓名与在班人数由调用方查询后传入
    pub fn into_class(
        self,
        teacher_name: Option<String>,
        enrolled_count: i64,
    ) -> crate::models::classes::entities::Class {
        use crate::models::classes::entities::{Class, Shift};
        use chrono::{DateTime, Utc};

        Class {
            id: self.id,
            name: self.name,
            grade_level: self.grade_level,
            shift: self.shift.parse::<Shift>().unwrap_or(Shift::Morning),
            school_year: self.school_year,
            capacity: self.capacity,
            teacher_id: self.teacher_id,
            teacher_name,
            room: self.room,
            enrolled_count,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn into_summary(self) -> crate::models::classes::entities::ClassSummary {
        use crate::models::classes::entities::{ClassSummary, Shift};

        ClassSummary {
            id: self.id,
            name: self.name,
            shift: self.shift.parse::<Shift>().unwrap_or(Shift::Morning),
            school_year: self.school_year,
        }
    }
}
