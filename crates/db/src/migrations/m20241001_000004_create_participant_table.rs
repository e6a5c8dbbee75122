//! Create participant table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participant::ParticipantType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participant::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Participant::Sex).string_len(32))
                    .col(ColumnDef::new(Participant::Age).integer())
                    .col(ColumnDef::new(Participant::Address).text())
                    .col(ColumnDef::new(Participant::EthnicGroup).string_len(128))
                    .col(ColumnDef::new(Participant::OtherEthnicGroup).string_len(128))
                    .col(ColumnDef::new(Participant::StudentId).string_len(64))
                    .col(ColumnDef::new(Participant::School).string_len(256))
                    .col(ColumnDef::new(Participant::YearLevel).string_len(32))
                    .col(ColumnDef::new(Participant::Section).string_len(64))
                    .col(ColumnDef::new(Participant::StaffId).string_len(64))
                    .col(ColumnDef::new(Participant::Department).string_len(256))
                    .col(ColumnDef::new(Participant::Organization).string_len(256))
                    .col(
                        ColumnDef::new(Participant::EventId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participant::AcademicPeriodId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participant::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participant_event")
                            .from(Participant::Table, Participant::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participant_academic_period")
                            .from(Participant::Table, Participant::AcademicPeriodId)
                            .to(AcademicPeriod::Table, AcademicPeriod::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for per-event rosters)
        manager
            .create_index(
                Index::create()
                    .name("idx_participant_event_id")
                    .table(Participant::Table)
                    .col(Participant::EventId)
                    .to_owned(),
            )
            .await?;

        // Index: (academic_period_id, participant_type) (for analytics scoping)
        manager
            .create_index(
                Index::create()
                    .name("idx_participant_period_type")
                    .table(Participant::Table)
                    .col(Participant::AcademicPeriodId)
                    .col(Participant::ParticipantType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Participant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Participant {
    Table,
    Id,
    ParticipantType,
    Name,
    Sex,
    Age,
    Address,
    EthnicGroup,
    OtherEthnicGroup,
    StudentId,
    School,
    YearLevel,
    Section,
    StaffId,
    Department,
    Organization,
    EventId,
    AcademicPeriodId,
    IsArchived,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

#[derive(Iden)]
enum AcademicPeriod {
    Table,
    Id,
}
