//! Public routes for the embeddable widget.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::widget;
use crate::state::AppState;

/// Routes mounted at `/widget`.
///
/// ```text
/// GET   /tours/{id}         -> get_tour
/// POST  /tours/{id}/events  -> record_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tours/{id}", get(widget::get_tour))
        .route("/tours/{id}/events", post(widget::record_event))
}
