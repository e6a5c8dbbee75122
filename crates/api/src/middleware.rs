//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use gad_core::{
    AcademicPeriodService, AccountService, ActivityLogService, DashboardService, EmployeeService,
    EventService, ImportService, NewsService, NotificationService, ParticipantService,
};

use crate::sse::SseBroadcaster;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub period_service: AcademicPeriodService,
    pub event_service: EventService,
    pub participant_service: ParticipantService,
    pub employee_service: EmployeeService,
    pub news_service: NewsService,
    pub notification_service: NotificationService,
    pub activity_log_service: ActivityLogService,
    pub import_service: ImportService,
    pub dashboard_service: DashboardService,
    pub sse_broadcaster: SseBroadcaster,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token continue anonymously;
/// extractors decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.account_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid bearer token"),
        }
    }

    next.run(req).await
}
