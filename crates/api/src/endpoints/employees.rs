//! Employee and survey endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use gad_common::AppResult;
use gad_core::services::employee::{CreateEmployeeInput, EmployeeDetails, SubmitSurveyInput};
use gad_db::entities::{employee, employee_survey};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Page, Pagination, ok},
};

/// Create employees router. Mounted at the API root since it owns two
/// top-level paths.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{employee_id}",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
        .route("/employees/{employee_id}/surveys", get(employee_surveys))
        .route("/surveys", get(list_surveys).post(submit_survey))
}

/// Survey submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyRequest {
    pub employee_id: String,
    #[serde(flatten)]
    pub survey: SubmitSurveyInput,
}

/// List surveys query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSurveysQuery {
    pub period_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Survey response joined with its employee.
#[derive(Debug, Serialize)]
pub struct SurveyWithEmployee {
    #[serde(flatten)]
    pub survey: employee_survey::Model,
    pub employee: Option<employee::Model>,
}

async fn list_employees(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<ApiResponse<Page<employee::Model>>> {
    let (items, total) = state
        .employee_service
        .list(pagination.limit(), pagination.offset)
        .await?;
    Ok(ApiResponse::ok(Page { items, total }))
}

async fn create_employee(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEmployeeInput>,
) -> AppResult<ApiResponse<employee::Model>> {
    let employee = state.employee_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(employee))
}

async fn get_employee(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<ApiResponse<employee::Model>> {
    Ok(ApiResponse::ok(state.employee_service.get(&employee_id).await?))
}

async fn update_employee(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Json(details): Json<EmployeeDetails>,
) -> AppResult<ApiResponse<employee::Model>> {
    let employee = state
        .employee_service
        .update(&user.id, &employee_id, details)
        .await?;
    Ok(ApiResponse::ok(employee))
}

async fn delete_employee(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.employee_service.delete(&admin.id, &employee_id).await?;
    Ok(ok())
}

async fn employee_surveys(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<ApiResponse<Vec<employee_survey::Model>>> {
    let surveys = state.employee_service.surveys_for(&employee_id).await?;
    Ok(ApiResponse::ok(surveys))
}

async fn list_surveys(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListSurveysQuery>,
) -> AppResult<ApiResponse<Page<SurveyWithEmployee>>> {
    let (rows, total) = state
        .employee_service
        .list_surveys(
            query.period_id.as_deref(),
            query.limit.clamp(1, 100),
            query.offset,
        )
        .await?;

    let items = rows
        .into_iter()
        .map(|(survey, employee)| SurveyWithEmployee { survey, employee })
        .collect();
    Ok(ApiResponse::ok(Page { items, total }))
}

async fn submit_survey(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmitSurveyRequest>,
) -> AppResult<ApiResponse<employee_survey::Model>> {
    let survey = state
        .employee_service
        .submit_survey(&user.id, &req.employee_id, req.survey)
        .await?;
    Ok(ApiResponse::created(survey))
}
