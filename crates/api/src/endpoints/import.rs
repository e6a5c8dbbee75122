//! Batch import endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use gad_common::{AppError, AppResult};
use gad_core::services::import::{ImportKind, ImportReport, ImportRequest};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Create import router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}", post(import))
}

/// Import a CSV, Excel or JSON payload. Row failures are reported in the
/// body; the request itself only fails on a malformed payload.
async fn import(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<ImportRequest>,
) -> AppResult<ApiResponse<ImportReport>> {
    let kind = ImportKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown import type: {kind}")))?;

    let report = state.import_service.import(&admin.id, kind, request).await?;
    Ok(ApiResponse::ok(report))
}
