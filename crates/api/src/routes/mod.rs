pub mod dashboard;
pub mod health;
pub mod tour;
pub mod widget;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /me                                         caller's profile (auth)
///
/// /tours                                      list, create
/// /tours/{id}                                 get, update, delete
/// /tours/{id}/status                          set status (PUT)
/// /tours/{id}/toggle-status                   toggle status (POST)
/// /tours/{id}/step-counts                     cached vs actual count
/// /tours/{id}/reconcile                       repair cached count (POST)
/// /tours/{id}/embed                           install snippet
/// /tours/{id}/steps                      list, create
/// /tours/{id}/steps/reorder              reorder (PUT)
/// /tours/{id}/steps/{step_id}            update, delete
/// /tours/{id}/steps/{step_id}/completion-rate
///
/// /dashboard/stats|recent-tours|step-performance
/// /analytics/metrics|weekly|step-views|skip-rates|tour-status
///
/// /widget/tours/{id}                          public steps payload
/// /widget/tours/{id}/events                   public event ingest (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::me::get_me))
        .nest("/tours", tour::router())
        .nest("/dashboard", dashboard::router())
        .nest("/analytics", dashboard::analytics_router())
        .nest("/widget", widget::router())
}
