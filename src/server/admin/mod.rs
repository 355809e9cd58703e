mod owners;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Owner routes
        .route("/owners", post(owners::create_owner))
        .route("/owners", get(owners::list_owners))
        .route("/owners/{id}", get(owners::get_owner))
        .route("/owners/{id}", delete(owners::delete_owner))
        .route("/owners/{id}/tokens", get(owners::list_owner_tokens))
        .route("/owners/{id}/tokens", post(owners::create_owner_token))
        // Token routes
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
}
