pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_school_tables;
mod m20250301_000002_create_finance_tables;
mod m20250308_000001_create_announcements;
mod m20250315_000001_payment_month_unique;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_school_tables::Migration),
            Box::new(m20250301_000002_create_finance_tables::Migration),
            Box::new(m20250308_000001_create_announcements::Migration),
            Box::new(m20250315_000001_payment_month_unique::Migration),
        ]
    }
}
