use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use server_api::{create_intake_form, list_intake_forms, update_intake_form};
use shared::{
    domain::{FormId, IntakeFormData},
    error::{ApiError, ErrorCode},
    protocol::{IntakeFormResponse, ListIntakeFormsResponse},
};
use tracing::error;

use crate::app_state::AppState;

type HttpResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state.api.storage.health_check().await.map_err(|e| {
        error_response(ApiError::new(ErrorCode::Internal, e.to_string()))
    })?;
    Ok("ok")
}

pub(crate) async fn http_list_intake_forms(
    State(state): State<Arc<AppState>>,
) -> HttpResult<ListIntakeFormsResponse> {
    let data = list_intake_forms(&state.api)
        .await
        .map_err(error_response)?;
    Ok(Json(ListIntakeFormsResponse { data }))
}

pub(crate) async fn http_create_intake_form(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IntakeFormData>, JsonRejection>,
) -> HttpResult<IntakeFormResponse> {
    let body = json_body(body)?;
    let data = create_intake_form(&state.api, &body)
        .await
        .map_err(error_response)?;
    Ok(Json(IntakeFormResponse { data }))
}

pub(crate) async fn http_update_intake_form(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
    body: Result<Json<IntakeFormData>, JsonRejection>,
) -> HttpResult<IntakeFormResponse> {
    let body = json_body(body)?;
    let data = update_intake_form(&state.api, &FormId::new(form_id), &body)
        .await
        .map_err(error_response)?;
    Ok(Json(IntakeFormResponse { data }))
}

/// Unreadable bodies become validation errors; an oversized body keeps its 413.
fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, (StatusCode, Json<ApiError>)> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ApiError::validation(rejection.body_text())),
        )),
        Err(rejection) => Err(error_response(ApiError::validation(rejection.body_text()))),
    }
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "intake form request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
