//! Handlers for the `/tours` resource.
//!
//! All endpoints require authentication and are scoped to the caller's tours.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tourflow_core::embed::{
    EmbedOptions, EmbedSnippet, WidgetPosition, WidgetTheme, PLACEHOLDER_API_KEY,
};
use tourflow_core::tour::{validate_min_steps, TourStatus};
use tourflow_core::types::DbId;
use tourflow_db::models::tour::{CreateTour, StepCounts, Tour, TourWithSteps, UpdateTour};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{EmbedParams, ListToursParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `PUT /tours/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: TourStatus,
}

/// `GET /tours` payload: bare tours, or tours with their steps.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TourList {
    Tours(Vec<Tour>),
    WithSteps(Vec<TourWithSteps>),
}

/// GET /api/v1/tours
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListToursParams>,
) -> AppResult<Json<DataResponse<TourList>>> {
    let data = if params.with_steps {
        TourList::WithSteps(state.tours.list_tours_with_steps(user.user_id).await?)
    } else {
        TourList::Tours(state.tours.list_tours(user.user_id).await?)
    };
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/tours
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTour>,
) -> AppResult<(StatusCode, Json<DataResponse<Tour>>)> {
    validate_min_steps(input.steps.len())?;
    let tour = state.tours.create_tour(user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: tour })))
}

/// GET /api/v1/tours/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TourWithSteps>>> {
    let tour = state.tours.get_tour(id, user.user_id).await?;
    Ok(Json(DataResponse { data: tour }))
}

/// PUT /api/v1/tours/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTour>,
) -> AppResult<Json<DataResponse<Tour>>> {
    let tour = state.tours.update_tour(id, user.user_id, &input).await?;
    Ok(Json(DataResponse { data: tour }))
}

/// DELETE /api/v1/tours/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.tours.delete_tour(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/tours/{id}/status
pub async fn set_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetStatusRequest>,
) -> AppResult<Json<DataResponse<Tour>>> {
    let tour = state.tours.set_status(id, user.user_id, input.status).await?;
    Ok(Json(DataResponse { data: tour }))
}

/// POST /api/v1/tours/{id}/toggle-status
pub async fn toggle_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Tour>>> {
    let tour = state.tours.toggle_status(id, user.user_id).await?;
    Ok(Json(DataResponse { data: tour }))
}

/// GET /api/v1/tours/{id}/step-counts
pub async fn step_counts(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StepCounts>>> {
    let counts = state.tours.step_counts(id, user.user_id).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// POST /api/v1/tours/{id}/reconcile
pub async fn reconcile(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StepCounts>>> {
    let counts = state.tours.reconcile(id, user.user_id).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// GET /api/v1/tours/{id}/embed
///
/// Install snippet for the tour. Unknown `theme` / `position` values are
/// rejected; absent ones use the widget defaults.
pub async fn embed(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<EmbedParams>,
) -> AppResult<Json<DataResponse<EmbedSnippet>>> {
    let tour = state.tours.find_tour(id, user.user_id).await?;

    let theme: Option<WidgetTheme> = params.theme.as_deref().map(str::parse).transpose()?;
    let position: Option<WidgetPosition> =
        params.position.as_deref().map(str::parse).transpose()?;
    let options = EmbedOptions {
        tour_id: tour.id,
        api_key: params
            .api_key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string()),
        theme: theme.unwrap_or_default(),
        position: position.unwrap_or_default(),
        api_base_url: state.config.public_api_url.clone(),
        widget_version: state.config.widget_version.clone(),
    };

    Ok(Json(DataResponse {
        data: options.render(),
    }))
}
