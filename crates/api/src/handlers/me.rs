//! Handler for the caller's own profile.

use axum::extract::State;
use axum::Json;
use tourflow_db::models::profile::{Profile, UpsertProfile};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/me
///
/// Upserts the profile from the token's identity and returns it.
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Profile>>> {
    let profile = state
        .store
        .upsert_profile(&UpsertProfile {
            id: user.user_id,
            email: user.email,
            display_name: user.display_name,
        })
        .await?;
    Ok(Json(DataResponse { data: profile }))
}
