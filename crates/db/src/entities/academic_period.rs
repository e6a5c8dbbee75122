//! Academic period entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of academic period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    #[sea_orm(string_value = "first_semester")]
    FirstSemester,
    #[sea_orm(string_value = "second_semester")]
    SecondSemester,
    #[sea_orm(string_value = "summer")]
    Summer,
}

/// A school-year window that scopes which events and participants are current.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "academic_period")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// School year label, e.g. `2024-2025`.
    pub school_year: String,

    pub period_type: PeriodType,

    pub start_date: Date,

    pub end_date: Date,

    /// At most one period is active at a time.
    #[sea_orm(default_value = false)]
    pub is_active: bool,

    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    #[sea_orm(nullable)]
    pub archived_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event::Entity")]
    Events,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
