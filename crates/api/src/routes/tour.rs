//! Route definitions for the `/tours` resource and its nested steps.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{step, tour};
use crate::state::AppState;

/// Routes mounted at `/tours`.
///
/// ```text
/// GET    /                                          -> list (?with_steps=)
/// POST   /                                          -> create
/// GET    /{id}                                      -> get_by_id
/// PUT    /{id}                                      -> update
/// DELETE /{id}                                      -> delete
/// PUT    /{id}/status                               -> set_status
/// POST   /{id}/toggle-status                        -> toggle_status
/// GET    /{id}/step-counts                          -> step_counts
/// POST   /{id}/reconcile                            -> reconcile
/// GET    /{id}/embed                                -> embed
///
/// GET    /{id}/steps                           -> list
/// POST   /{id}/steps                           -> create
/// PUT    /{id}/steps/reorder                   -> reorder
/// PUT    /{id}/steps/{step_id}                 -> update
/// DELETE /{id}/steps/{step_id}                 -> delete
/// PUT    /{id}/steps/{step_id}/completion-rate -> set_completion_rate
/// ```
pub fn router() -> Router<AppState> {
    let step_routes = Router::new()
        .route("/", get(step::list).post(step::create))
        .route("/reorder", put(step::reorder))
        .route("/{step_id}", put(step::update).delete(step::delete))
        .route("/{step_id}/completion-rate", put(step::set_completion_rate));

    Router::new()
        .route("/", get(tour::list).post(tour::create))
        .route(
            "/{id}",
            get(tour::get_by_id).put(tour::update).delete(tour::delete),
        )
        .route("/{id}/status", put(tour::set_status))
        .route("/{id}/toggle-status", post(tour::toggle_status))
        .route("/{id}/step-counts", get(tour::step_counts))
        .route("/{id}/reconcile", post(tour::reconcile))
        .route("/{id}/embed", get(tour::embed))
        .nest("/{id}/steps", step_routes)
}
