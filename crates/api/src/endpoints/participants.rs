//! Participant endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use gad_common::AppResult;
use gad_core::services::participant::{CreateParticipantInput, ParticipantDetails};
use gad_db::{
    entities::participant::{self, ParticipantType},
    repositories::ParticipantFilter,
};
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Page, ok},
};

/// Create participants router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_participants).post(create_participant))
        .route(
            "/{id}",
            get(get_participant)
                .put(update_participant)
                .delete(delete_participant),
        )
        .route("/{id}/archive", post(archive_participant))
}

/// List participants query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParticipantsQuery {
    pub event_id: Option<String>,
    pub period_id: Option<String>,
    #[serde(rename = "type")]
    pub participant_type: Option<ParticipantType>,
    #[serde(default)]
    pub include_archived: bool,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

async fn list_participants(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListParticipantsQuery>,
) -> AppResult<ApiResponse<Page<participant::Model>>> {
    let filter = ParticipantFilter {
        event_id: query.event_id,
        academic_period_id: query.period_id,
        participant_type: query.participant_type,
        include_archived: query.include_archived,
    };

    let (items, total) = state
        .participant_service
        .list(&filter, query.limit.clamp(1, 500), query.offset)
        .await?;
    Ok(ApiResponse::ok(Page { items, total }))
}

async fn create_participant(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateParticipantInput>,
) -> AppResult<ApiResponse<participant::Model>> {
    let participant = state.participant_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(participant))
}

async fn get_participant(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<participant::Model>> {
    Ok(ApiResponse::ok(state.participant_service.get(&id).await?))
}

async fn update_participant(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(details): Json<ParticipantDetails>,
) -> AppResult<ApiResponse<participant::Model>> {
    let participant = state
        .participant_service
        .update(&user.id, &id, details)
        .await?;
    Ok(ApiResponse::ok(participant))
}

async fn delete_participant(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.participant_service.delete(&admin.id, &id).await?;
    Ok(ok())
}

async fn archive_participant(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<participant::Model>> {
    let participant = state.participant_service.archive(&admin.id, &id).await?;
    Ok(ApiResponse::ok(participant))
}
