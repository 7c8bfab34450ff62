//! Handlers for the dashboard header and recent tours panel.
//!
//! These never fail on store errors: the services log and fall back to
//! defaults, so every endpoint answers 200 for an authenticated caller.

use axum::extract::{Query, State};
use axum::Json;
use tourflow_core::analytics::StepPerformance;
use tourflow_db::dashboard::{DashboardStats, RECENT_TOURS_LIMIT};
use tourflow_db::models::tour::RecentTour;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound for `?limit=` on the recent tours panel.
const MAX_RECENT_TOURS: i64 = 50;

/// GET /api/v1/dashboard/stats
pub async fn stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let data = state.dashboard.stats(user.user_id).await;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/dashboard/recent-tours
pub async fn recent_tours(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<RecentTour>>>> {
    let limit = params.resolve(RECENT_TOURS_LIMIT, MAX_RECENT_TOURS);
    let data = state.dashboard.recent_tours(user.user_id, limit).await;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/dashboard/step-performance
pub async fn step_performance(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StepPerformance>>>> {
    let data = state.dashboard.average_step_performance(user.user_id).await;
    Ok(Json(DataResponse { data }))
}
