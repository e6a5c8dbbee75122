//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use gad_common::AppResult;
use gad_core::services::account::{SigninInput, SignupInput};
use gad_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/i", get(me))
}

/// Sign-in response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub user: user::Model,
}

/// Register a new account. It stays pending until an administrator approves it.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.signup(input).await?;
    Ok(ApiResponse::created(user))
}

/// Sign in with username or email.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SigninInput>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let (user, token) = state.account_service.signin(input).await?;
    Ok(ApiResponse::ok(SigninResponse { token, user }))
}

/// Invalidate the caller's token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.account_service.signout(&user.id).await?;
    Ok(ok())
}

/// The signed-in user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<user::Model> {
    ApiResponse::ok(user)
}
