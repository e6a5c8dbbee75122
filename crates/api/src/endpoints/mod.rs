//! API endpoints.

mod activity_logs;
mod analytics;
mod auth;
mod employees;
mod events;
mod import;
mod news;
mod notifications;
mod participants;
mod periods;
mod users;

use axum::Router;

use crate::middleware::AppState;
use crate::sse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(analytics::router())
        .merge(employees::router())
        .nest("/users", users::router())
        .nest("/periods", periods::router())
        .nest("/events", events::router())
        .nest("/participants", participants::router())
        .nest("/news", news::router())
        .nest("/notifications", notifications::router())
        .nest("/activity-logs", activity_logs::router())
        .nest("/import", import::router())
        .nest("/streaming", sse::router())
}
