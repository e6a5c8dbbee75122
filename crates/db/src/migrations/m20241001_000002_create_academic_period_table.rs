//! Create academic period table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AcademicPeriod::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AcademicPeriod::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AcademicPeriod::SchoolYear)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AcademicPeriod::PeriodType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AcademicPeriod::StartDate).date().not_null())
                    .col(ColumnDef::new(AcademicPeriod::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(AcademicPeriod::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AcademicPeriod::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AcademicPeriod::ArchivedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AcademicPeriod::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (is_archived, end_date) (for the archival sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_academic_period_archived_end_date")
                    .table(AcademicPeriod::Table)
                    .col(AcademicPeriod::IsArchived)
                    .col(AcademicPeriod::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AcademicPeriod::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AcademicPeriod {
    Table,
    Id,
    SchoolYear,
    PeriodType,
    StartDate,
    EndDate,
    IsActive,
    IsArchived,
    ArchivedAt,
    CreatedAt,
}
