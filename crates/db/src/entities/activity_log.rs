//! Activity log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failure")]
    Failure,
}

/// Append-only audit record of administrative actions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Acting user; `None` for scheduler actions.
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    /// Short verb such as `event.create`.
    pub action: String,

    pub entity_type: String,

    #[sea_orm(nullable)]
    pub entity_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    pub status: ActivityStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
