//! Route definitions for the dashboard and analytics pages.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::{analytics, dashboard};
use crate::state::AppState;

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET  /stats             -> stats
/// GET  /recent-tours      -> recent_tours (?limit=)
/// GET  /step-performance  -> step_performance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/recent-tours", get(dashboard::recent_tours))
        .route("/step-performance", get(dashboard::step_performance))
}

/// Routes mounted at `/analytics`.
///
/// ```text
/// GET  /metrics      -> metrics
/// GET  /weekly       -> weekly
/// GET  /step-views   -> step_views
/// GET  /skip-rates   -> skip_rates
/// GET  /tour-status  -> tour_status
/// ```
pub fn analytics_router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(analytics::metrics))
        .route("/weekly", get(analytics::weekly))
        .route("/step-views", get(analytics::step_views))
        .route("/skip-rates", get(analytics::skip_rates))
        .route("/tour-status", get(analytics::tour_status))
}
