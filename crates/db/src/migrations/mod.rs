//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20241001_000001_create_user_table;
mod m20241001_000002_create_academic_period_table;
mod m20241001_000003_create_event_table;
mod m20241001_000004_create_participant_table;
mod m20241001_000005_create_employee_tables;
mod m20241001_000006_create_news_table;
mod m20241001_000007_create_notification_table;
mod m20241001_000008_create_activity_log_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_user_table::Migration),
            Box::new(m20241001_000002_create_academic_period_table::Migration),
            Box::new(m20241001_000003_create_event_table::Migration),
            Box::new(m20241001_000004_create_participant_table::Migration),
            Box::new(m20241001_000005_create_employee_tables::Migration),
            Box::new(m20241001_000006_create_news_table::Migration),
            Box::new(m20241001_000007_create_notification_table::Migration),
            Box::new(m20241001_000008_create_activity_log_table::Migration),
        ]
    }
}
