//! Participant entity.
//!
//! Students, staff/faculty and community members share one table; the
//! `participant_type` column decides which identifier columns are filled.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "community")]
    Community,
}

impl ParticipantType {
    /// Human-readable label used in charts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Staff => "Staff/Faculty",
            Self::Community => "Community Member",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participant")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub participant_type: ParticipantType,

    pub name: String,

    /// Free text as entered; normalized only when aggregating.
    #[sea_orm(nullable)]
    pub sex: Option<String>,

    #[sea_orm(nullable)]
    pub age: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(nullable)]
    pub ethnic_group: Option<String>,

    /// Free text used when `ethnic_group` is "Other".
    #[sea_orm(nullable)]
    pub other_ethnic_group: Option<String>,

    // Student fields
    #[sea_orm(nullable)]
    pub student_id: Option<String>,
    #[sea_orm(nullable)]
    pub school: Option<String>,
    #[sea_orm(nullable)]
    pub year_level: Option<String>,
    #[sea_orm(nullable)]
    pub section: Option<String>,

    // Staff/faculty fields
    #[sea_orm(nullable)]
    pub staff_id: Option<String>,
    #[sea_orm(nullable)]
    pub department: Option<String>,

    // Community fields
    #[sea_orm(nullable)]
    pub organization: Option<String>,

    pub event_id: String,

    pub academic_period_id: String,

    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,

    #[sea_orm(
        belongs_to = "super::academic_period::Entity",
        from = "Column::AcademicPeriodId",
        to = "super::academic_period::Column::Id"
    )]
    AcademicPeriod,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
