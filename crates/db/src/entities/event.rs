//! Event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[sea_orm(string_value = "academic")]
    Academic,
    #[sea_orm(string_value = "non_academic")]
    NonAcademic,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub date: Date,

    pub start_time: Time,

    pub end_time: Time,

    pub venue: String,

    pub event_type: EventType,

    pub category: String,

    /// Length of the time range, computed on write.
    pub duration_minutes: i32,

    /// User who created the event
    pub created_by: String,

    pub academic_period_id: String,

    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    #[sea_orm(default_value = false)]
    pub show_on_homepage: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::academic_period::Entity",
        from = "Column::AcademicPeriodId",
        to = "super::academic_period::Column::Id"
    )]
    AcademicPeriod,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,

    #[sea_orm(has_many = "super::participant::Entity")]
    Participants,
}

impl Related<super::academic_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicPeriod.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
