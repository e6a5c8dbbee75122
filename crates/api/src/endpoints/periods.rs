//! Academic period endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use gad_common::AppResult;
use gad_core::services::academic_period::{CreatePeriodInput, UpdatePeriodInput};
use gad_db::entities::academic_period;
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Create periods router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_periods).post(create_period))
        .route("/active", get(active_period))
        .route("/{id}", get(get_period).put(update_period))
        .route("/{id}/activate", post(activate_period))
        .route("/{id}/archive", post(archive_period))
}

/// List periods query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPeriodsQuery {
    #[serde(default = "default_include_archived")]
    pub include_archived: bool,
}

const fn default_include_archived() -> bool {
    true
}

async fn list_periods(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListPeriodsQuery>,
) -> AppResult<ApiResponse<Vec<academic_period::Model>>> {
    let periods = state.period_service.list(query.include_archived).await?;
    Ok(ApiResponse::ok(periods))
}

async fn create_period(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePeriodInput>,
) -> AppResult<ApiResponse<academic_period::Model>> {
    let period = state.period_service.create(&admin.id, input).await?;
    Ok(ApiResponse::created(period))
}

/// The active period, or `null` when none is active.
async fn active_period(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Option<academic_period::Model>>> {
    Ok(ApiResponse::ok(state.period_service.get_active().await?))
}

async fn get_period(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<academic_period::Model>> {
    Ok(ApiResponse::ok(state.period_service.get(&id).await?))
}

async fn update_period(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePeriodInput>,
) -> AppResult<ApiResponse<academic_period::Model>> {
    let period = state.period_service.update(&admin.id, &id, input).await?;
    Ok(ApiResponse::ok(period))
}

async fn activate_period(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<academic_period::Model>> {
    let period = state.period_service.activate(&admin.id, &id).await?;
    Ok(ApiResponse::ok(period))
}

async fn archive_period(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<academic_period::Model>> {
    let period = state.period_service.archive(Some(&admin.id), &id).await?;
    Ok(ApiResponse::ok(period))
}
