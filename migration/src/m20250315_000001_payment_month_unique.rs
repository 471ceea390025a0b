use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "uq_payments_student_month_open";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                // 同一学生同一月份只允许一条未取消的收费记录
                manager
                    .get_connection()
                    .execute_unprepared(&format!(
                        "CREATE UNIQUE INDEX IF NOT EXISTS {INDEX_NAME} \
                         ON payments (student_id, reference_month) \
                         WHERE status <> 'cancelled' AND reference_month IS NOT NULL"
                    ))
                    .await?;
            }
            // MySQL 没有部分索引，依赖生成时的事务内检查
            _ => {}
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                manager
                    .get_connection()
                    .execute_unprepared(&format!("DROP INDEX IF EXISTS {INDEX_NAME}"))
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }
}
