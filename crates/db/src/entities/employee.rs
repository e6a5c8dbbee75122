//! Employee entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Employee demographic record, keyed by the institution's employee number.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employee")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Employee number shared with survey responses.
    #[sea_orm(unique)]
    pub employee_id: String,

    pub name: String,

    #[sea_orm(nullable)]
    pub sex: Option<String>,

    #[sea_orm(nullable)]
    pub age: Option<i32>,

    #[sea_orm(nullable)]
    pub position: Option<String>,

    #[sea_orm(nullable)]
    pub department: Option<String>,

    #[sea_orm(nullable)]
    pub education_level: Option<String>,

    #[sea_orm(nullable)]
    pub civil_status: Option<String>,

    #[sea_orm(nullable)]
    pub employment_status: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(nullable)]
    pub ethnic_group: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::employee_survey::Entity")]
    Surveys,
}

impl Related<super::employee_survey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Surveys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
