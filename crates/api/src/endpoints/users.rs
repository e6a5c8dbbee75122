//! User administration endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use gad_common::AppResult;
use gad_db::entities::user::{self, ApprovalStatus, UserRole};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Create users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/pending-count", get(pending_count))
        .route("/{id}", get(get_user))
        .route("/{id}/approve", post(approve_user))
        .route("/{id}/reject", post(reject_user))
        .route("/{id}/role", post(set_role))
}

/// List users query.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub status: Option<ApprovalStatus>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

/// Change role request.
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<ApiResponse<Vec<user::Model>>> {
    let users = state
        .account_service
        .list(query.status, query.limit.min(100), query.offset)
        .await?;
    Ok(ApiResponse::ok(users))
}

/// Registrations awaiting review.
#[derive(Debug, Serialize)]
pub struct PendingCount {
    pub count: u64,
}

async fn pending_count(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PendingCount>> {
    let count = state.account_service.count_pending().await?;
    Ok(ApiResponse::ok(PendingCount { count }))
}

async fn get_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<user::Model>> {
    Ok(ApiResponse::ok(state.account_service.get(&id).await?))
}

async fn approve_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.approve(&admin.id, &id).await?;
    info!(user_id = %user.id, admin_id = %admin.id, "User approved");
    Ok(ApiResponse::ok(user))
}

async fn reject_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.reject(&admin.id, &id).await?;
    info!(user_id = %user.id, admin_id = %admin.id, "User rejected");
    Ok(ApiResponse::ok(user))
}

async fn set_role(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.set_role(&admin.id, &id, req.role).await?;
    Ok(ApiResponse::ok(user))
}
