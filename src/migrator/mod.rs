use sea_orm_migration::prelude::*;

mod m20260301_000001_create_core_tables;
mod m20260301_000002_create_setpoint_log;
mod m20260305_000001_create_alert_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_core_tables::Migration),
            Box::new(m20260301_000002_create_setpoint_log::Migration),
            Box::new(m20260305_000001_create_alert_tables::Migration),
        ]
    }
}
