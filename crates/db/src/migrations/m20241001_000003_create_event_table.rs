//! Create event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Event::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Event::Description).text())
                    .col(ColumnDef::new(Event::Date).date().not_null())
                    .col(ColumnDef::new(Event::StartTime).time().not_null())
                    .col(ColumnDef::new(Event::EndTime).time().not_null())
                    .col(ColumnDef::new(Event::Venue).string_len(256).not_null())
                    .col(ColumnDef::new(Event::EventType).string_len(16).not_null())
                    .col(ColumnDef::new(Event::Category).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Event::DurationMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Event::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Event::AcademicPeriodId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Event::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Event::ShowOnHomepage)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_academic_period")
                            .from(Event::Table, Event::AcademicPeriodId)
                            .to(AcademicPeriod::Table, AcademicPeriod::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_created_by")
                            .from(Event::Table, Event::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: academic_period_id (for period scoping)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_academic_period_id")
                    .table(Event::Table)
                    .col(Event::AcademicPeriodId)
                    .to_owned(),
            )
            .await?;

        // Index: date (for calendar ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_date")
                    .table(Event::Table)
                    .col(Event::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Name,
    Description,
    Date,
    StartTime,
    EndTime,
    Venue,
    EventType,
    Category,
    DurationMinutes,
    CreatedBy,
    AcademicPeriodId,
    IsArchived,
    ShowOnHomepage,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AcademicPeriod {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
