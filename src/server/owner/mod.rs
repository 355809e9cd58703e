mod account;
mod cafe;
mod dashboard;
mod redemptions;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;

pub fn owner_router() -> Router<Arc<AppState>> {
    Router::new()
        // Account
        .route("/auth/signup", post(account::sign_up))
        .route("/auth/signin", post(account::sign_in))
        .route("/auth/signout", post(account::sign_out))
        .route("/me", get(account::me))
        // Cafe setup and settings
        .route(
            "/cafe",
            get(cafe::get_cafe)
                .post(cafe::create_cafe)
                .patch(cafe::update_cafe),
        )
        .route("/cafe/nfc", put(cafe::set_nfc_tag))
        .route("/cafe/links", get(cafe::get_links))
        .route("/cafe/qr.svg", get(cafe::get_qr_code))
        // Dashboard
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/customers", get(dashboard::list_customers))
        // Rewards
        .route("/redemptions", get(redemptions::list_redemptions))
        .route("/redemptions/verify", post(redemptions::verify_redemption))
}
