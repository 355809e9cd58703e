use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireOwner;
use crate::loyalty::{list_redemptions as recent_redemptions, owner_cafe, verify_at_counter};
use crate::server::AppState;
use crate::server::dto::{VerifyRequest, VerifyResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn list_redemptions(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    let redemptions = recent_redemptions(state.store.as_ref(), &cafe.id, state.clock.as_ref())
        .api_err("Failed to load redemptions")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(redemptions)))
}

pub async fn verify_redemption(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;

    let outcome = verify_at_counter(
        state.store.as_ref(),
        state.clock.as_ref(),
        &cafe.id,
        &req.code,
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(VerifyResponse {
        message: outcome.verified.message(),
        redemption: outcome.verified,
        redemptions: outcome.redemptions,
    })))
}
