//! Activity log endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use gad_common::AppResult;
use gad_db::entities::activity_log;
use serde::Deserialize;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Create activity log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

/// Activity log query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub user_id: Option<String>,
    pub entity_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

async fn list_activity(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<ApiResponse<Vec<activity_log::Model>>> {
    let entries = state
        .activity_log_service
        .list(
            query.user_id.as_deref(),
            query.entity_type.as_deref(),
            query.limit.clamp(1, 200),
            query.offset,
        )
        .await?;
    Ok(ApiResponse::ok(entries))
}
