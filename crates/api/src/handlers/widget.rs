//! Public handlers consumed by the embeddable widget. No authentication.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tourflow_core::types::DbId;
use tourflow_db::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};
use tourflow_db::models::tour::WidgetTour;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/widget/tours/{id}
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WidgetTour>>> {
    let tour = state.widget.widget_tour(id).await?;
    Ok(Json(DataResponse { data: tour }))
}

/// POST /api/v1/widget/tours/{id}/events
pub async fn record_event(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateAnalyticsEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<AnalyticsEventRow>>)> {
    let row = state.widget.record_event(id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: row })))
}
