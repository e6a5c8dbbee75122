//! Dashboard and analytics endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use gad_common::AppResult;
use gad_core::services::dashboard::{DashboardSummary, EmployeeAnalytics, ParticipantAnalytics};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(summary))
        .route("/analytics/participants", get(participant_analytics))
        .route("/analytics/employees", get(employee_analytics))
}

/// Participant analytics scope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub period_id: Option<String>,
    pub event_id: Option<String>,
}

async fn summary(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardSummary>> {
    let summary = state
        .dashboard_service
        .summary(&user.id, user.is_admin())
        .await?;
    Ok(ApiResponse::ok(summary))
}

async fn participant_analytics(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<ApiResponse<ParticipantAnalytics>> {
    let analytics = state
        .dashboard_service
        .participant_analytics(query.period_id, query.event_id)
        .await?;
    Ok(ApiResponse::ok(analytics))
}

async fn employee_analytics(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<EmployeeAnalytics>> {
    Ok(ApiResponse::ok(
        state.dashboard_service.employee_analytics().await?,
    ))
}
