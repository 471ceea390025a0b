//! SeaORM 实体定义
//!
//! 与 models 中的业务实体分离，Storage 层查询后再转换为业务实体。

pub mod prelude;

pub mod announcements;
pub mod classes;
pub mod payments;
pub mod students;
pub mod teachers;
pub mod transactions;
pub mod users;
