//! Handlers for the analytics page charts.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tourflow_core::analytics::{DailyViews, EngagementMetrics};
use tourflow_db::dashboard::StatusCount;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// One bar of the step views chart.
#[derive(Debug, Serialize)]
pub struct StepViewsPoint {
    pub step: String,
    pub views: u64,
}

/// One bar of the skip rate chart.
#[derive(Debug, Serialize)]
pub struct SkipRatePoint {
    pub step: String,
    pub rate: u32,
}

/// GET /api/v1/analytics/metrics
pub async fn metrics(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<EngagementMetrics>>> {
    let data = state.dashboard.metrics(user.user_id).await;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/weekly
pub async fn weekly(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DailyViews>>>> {
    let data = state.dashboard.weekly_views(user.user_id, Utc::now()).await;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/step-views
pub async fn step_views(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StepViewsPoint>>>> {
    let data = state
        .dashboard
        .step_funnel(user.user_id)
        .await
        .iter()
        .map(|f| StepViewsPoint {
            step: format!("Step {}", f.step_number),
            views: f.engagement(),
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/skip-rates
pub async fn skip_rates(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SkipRatePoint>>>> {
    let data = state
        .dashboard
        .step_funnel(user.user_id)
        .await
        .iter()
        .map(|f| SkipRatePoint {
            step: format!("Step {}", f.step_number),
            rate: f.skip_rate(),
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/tour-status
pub async fn tour_status(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StatusCount>>>> {
    let data = state.dashboard.tour_status_breakdown(user.user_id).await;
    Ok(Json(DataResponse { data }))
}
