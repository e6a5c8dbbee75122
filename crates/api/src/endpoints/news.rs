//! News endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use gad_common::{AppError, AppResult};
use gad_core::services::news::{CreateNewsInput, UpdateNewsInput};
use gad_db::entities::news;
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Create news router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route("/{id}", get(get_news).put(update_news).delete(delete_news))
}

/// List news query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNewsQuery {
    #[serde(default)]
    pub include_drafts: bool,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Published posts for everyone; administrators may ask for drafts too.
async fn list_news(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNewsQuery>,
) -> AppResult<ApiResponse<Vec<news::Model>>> {
    let limit = query.limit.clamp(1, 100);
    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());

    let posts = if query.include_drafts && is_admin {
        state.news_service.list(limit, query.offset).await?
    } else {
        state.news_service.published(limit, query.offset).await?
    };
    Ok(ApiResponse::ok(posts))
}

async fn create_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    let post = state.news_service.create(&admin.id, input).await?;
    Ok(ApiResponse::created(post))
}

async fn get_news(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<news::Model>> {
    let post = state.news_service.get(&id).await?;

    // Drafts are invisible outside the admin console
    if !post.is_published && !user.as_ref().is_some_and(|u| u.is_admin()) {
        return Err(AppError::NotFound(format!("News not found: {id}")));
    }

    Ok(ApiResponse::ok(post))
}

async fn update_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    let post = state.news_service.update(&admin.id, &id, input).await?;
    Ok(ApiResponse::ok(post))
}

async fn delete_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.news_service.delete(&admin.id, &id).await?;
    Ok(ok())
}
