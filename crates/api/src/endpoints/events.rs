//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use gad_common::AppResult;
use gad_core::services::event::{CreateEventInput, UpdateEventInput};
use gad_db::{entities::event, repositories::EventFilter};
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Page, ok},
};

/// Create events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/homepage", get(homepage_events))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(archive_event),
        )
        .route("/{id}/homepage", post(set_homepage))
}

/// List events query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub period_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Homepage toggle request.
#[derive(Debug, Deserialize)]
pub struct HomepageRequest {
    pub show: bool,
}

async fn list_events(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> AppResult<ApiResponse<Page<event::Model>>> {
    let filter = EventFilter {
        academic_period_id: query.period_id,
        include_archived: query.include_archived,
        homepage_only: false,
        search: query.search,
    };

    let (items, total) = state
        .event_service
        .list(&filter, query.limit.clamp(1, 100), query.offset)
        .await?;
    Ok(ApiResponse::ok(Page { items, total }))
}

/// Public list of events flagged for the homepage.
async fn homepage_events(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<event::Model>>> {
    Ok(ApiResponse::ok(state.event_service.homepage(20).await?))
}

async fn create_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state.event_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(event))
}

async fn get_event(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<event::Model>> {
    Ok(ApiResponse::ok(state.event_service.get(&id).await?))
}

async fn update_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state.event_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(event))
}

/// Events are archived, never hard-deleted.
async fn archive_event(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.event_service.archive(&admin.id, &id).await?;
    Ok(ok())
}

async fn set_homepage(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HomepageRequest>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state
        .event_service
        .set_homepage(&user.id, &id, req.show)
        .await?;
    Ok(ApiResponse::ok(event))
}
