use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireOwner;
use crate::loyalty::{load_customers, owner_cafe};
use crate::server::AppState;
use crate::server::dto::DashboardResponse;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn get_dashboard(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    let stats = state
        .store
        .cafe_stats(&cafe.id, state.clock.now())
        .api_err("Failed to load stats")?;
    let links = state.links_for(&cafe.id);

    Ok::<_, ApiError>(Json(ApiResponse::success(DashboardResponse {
        cafe,
        stats,
        links,
    })))
}

pub async fn list_customers(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let overview = load_customers(
        state.store.as_ref(),
        &auth.owner.id,
        state.clock.as_ref(),
    )?;
    Ok::<_, ApiError>(Json(ApiResponse::success(overview)))
}
