//! Handlers for steps nested under `/tours/{id}/steps`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tourflow_core::tour::validate_step_removal;
use tourflow_core::types::DbId;
use tourflow_db::models::step::{CreateStep, TourStep, UpdateStep};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `PUT /tours/{id}/steps/reorder`.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub step_ids: Vec<DbId>,
}

/// Body for `PUT /tours/{id}/steps/{step_id}/completion-rate`.
#[derive(Debug, Deserialize)]
pub struct CompletionRateRequest {
    pub completion_rate: f64,
}

/// GET /api/v1/tours/{id}/steps
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TourStep>>>> {
    let steps = state.tours.list_steps(tour_id, user.user_id).await?;
    Ok(Json(DataResponse { data: steps }))
}

/// POST /api/v1/tours/{id}/steps
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<CreateStep>,
) -> AppResult<(StatusCode, Json<DataResponse<TourStep>>)> {
    let step = state.tours.add_step(tour_id, user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: step })))
}

/// PUT /api/v1/tours/{id}/steps/reorder
pub async fn reorder(
    user: AuthUser,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<Json<DataResponse<Vec<TourStep>>>> {
    let steps = state
        .tours
        .reorder_steps(tour_id, user.user_id, &input.step_ids)
        .await?;
    Ok(Json(DataResponse { data: steps }))
}

/// PUT /api/v1/tours/{id}/steps/{step_id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path((tour_id, step_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateStep>,
) -> AppResult<Json<DataResponse<TourStep>>> {
    let step = state
        .tours
        .update_step(step_id, tour_id, user.user_id, &input)
        .await?;
    Ok(Json(DataResponse { data: step }))
}

/// DELETE /api/v1/tours/{id}/steps/{step_id}
///
/// Refuses to take a tour below the minimum step count.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path((tour_id, step_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let counts = state.tours.step_counts(tour_id, user.user_id).await?;
    validate_step_removal(usize::try_from(counts.actual).unwrap_or(0))?;

    state
        .tours
        .delete_step(step_id, tour_id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/tours/{id}/steps/{step_id}/completion-rate
pub async fn set_completion_rate(
    user: AuthUser,
    State(state): State<AppState>,
    Path((tour_id, step_id)): Path<(DbId, DbId)>,
    Json(input): Json<CompletionRateRequest>,
) -> AppResult<Json<DataResponse<TourStep>>> {
    let step = state
        .tours
        .set_completion_rate(step_id, tour_id, user.user_id, input.completion_rate)
        .await?;
    Ok(Json(DataResponse { data: step }))
}
