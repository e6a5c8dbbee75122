//! Create employee and employee survey tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Employee::EmployeeId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employee::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Employee::Sex).string_len(32))
                    .col(ColumnDef::new(Employee::Age).integer())
                    .col(ColumnDef::new(Employee::Position).string_len(256))
                    .col(ColumnDef::new(Employee::Department).string_len(256))
                    .col(ColumnDef::new(Employee::EducationLevel).string_len(128))
                    .col(ColumnDef::new(Employee::CivilStatus).string_len(32))
                    .col(ColumnDef::new(Employee::EmploymentStatus).string_len(64))
                    .col(ColumnDef::new(Employee::Address).text())
                    .col(ColumnDef::new(Employee::EthnicGroup).string_len(128))
                    .col(
                        ColumnDef::new(Employee::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Employee::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmployeeSurvey::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmployeeSurvey::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmployeeSurvey::EmployeeId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmployeeSurvey::AcademicPeriodId).string_len(32))
                    .col(
                        ColumnDef::new(EmployeeSurvey::Responses)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployeeSurvey::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_survey_employee")
                            .from(EmployeeSurvey::Table, EmployeeSurvey::EmployeeId)
                            .to(Employee::Table, Employee::EmployeeId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: employee_id (for per-employee survey history)
        manager
            .create_index(
                Index::create()
                    .name("idx_employee_survey_employee_id")
                    .table(EmployeeSurvey::Table)
                    .col(EmployeeSurvey::EmployeeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmployeeSurvey::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Employee {
    Table,
    Id,
    EmployeeId,
    Name,
    Sex,
    Age,
    Position,
    Department,
    EducationLevel,
    CivilStatus,
    EmploymentStatus,
    Address,
    EthnicGroup,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EmployeeSurvey {
    Table,
    Id,
    EmployeeId,
    AcademicPeriodId,
    Responses,
    SubmittedAt,
}
